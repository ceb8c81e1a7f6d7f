//! At-most-once guard for user-triggered submissions.

use std::sync::atomic::{AtomicBool, Ordering};

/// Marks an operation as pending; a second caller is refused until the
/// first one's token is dropped.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    pub fn new() -> Self { Self::default() }

    pub fn try_begin(&self) -> Option<InFlightToken<'_>> {
        self.0.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        Some(InFlightToken(&self.0))
    }

    pub fn is_pending(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Releases the guard on drop, including when the owning future is abandoned.
#[derive(Debug)]
pub struct InFlightToken<'a>(&'a AtomicBool);

impl Drop for InFlightToken<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}
