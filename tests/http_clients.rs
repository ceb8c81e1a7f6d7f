//! HTTP clients against an in-process fake backend.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opensase_checkout::config::CarrierConfig;
use opensase_checkout::domain::aggregates::{CreateOrderRequest, OrderLine, PaymentMethod, VoucherValue};
use opensase_checkout::domain::value_objects::{IdempotencyKey, Money, Percent, ProductId};
use opensase_checkout::services::wire::{FeeRequest, RedemptionRequest};
use opensase_checkout::services::{BackendClient, CarrierClient, CarrierService, GeographyService, OrderService, PromotionService};
use opensase_checkout::{CheckoutError, StorefrontConfig};

#[derive(Clone, Debug)]
struct Seen { path: &'static str, headers: HeaderMap, query: HashMap<String, String>, body: Value }

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Seen>>>);

impl Recorder {
    fn push(&self, seen: Seen) { self.0.lock().unwrap().push(seen); }
    fn take(&self) -> Vec<Seen> { std::mem::take(&mut *self.0.lock().unwrap()) }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn carrier_app(recorder: Recorder) -> Router {
    Router::new()
        .route("/master-data/province", get(|State(r): State<Recorder>, headers: HeaderMap| async move {
            r.push(Seen { path: "province", headers, query: HashMap::new(), body: Value::Null });
            Json(json!({ "code": 200, "message": "Success", "data": [
                { "ProvinceID": 202, "ProvinceName": "Hồ Chí Minh" },
                { "ProvinceID": 201, "ProvinceName": "Hà Nội" }
            ]}))
        }))
        .route("/master-data/district", get(|State(r): State<Recorder>, headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
            r.push(Seen { path: "district", headers, query, body: Value::Null });
            Json(json!({ "code": 200, "data": [{ "DistrictID": 3695, "DistrictName": "Thủ Đức", "ProvinceID": 202 }] }))
        }))
        .route("/master-data/ward", get(|| async { Json(json!({ "code": 200, "data": null })) }))
        .route("/v2/shipping-order/fee", post(|State(r): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>| async move {
            r.push(Seen { path: "fee", headers, query: HashMap::new(), body });
            Json(json!({ "code": 200, "message": "Success", "data": { "total": 22000, "service_fee": 20000, "insurance_fee": 2000 } }))
        }))
        .with_state(recorder)
}

fn carrier_config(base_url: &str) -> CarrierConfig {
    CarrierConfig { base_url: base_url.to_string(), shop_id: Some("885".into()), ..CarrierConfig::new("ghn-token") }
}

fn fee_request() -> FeeRequest {
    FeeRequest {
        service_type_id: 2, insurance_value: 230_000, coupon: None,
        from_district_id: 3695, from_ward_code: "90737".into(), to_district_id: 1463, to_ward_code: "21808".into(),
        height: 15, length: 15, weight: 200, width: 15,
    }
}

#[tokio::test]
async fn carrier_fee_sends_token_shop_and_parcel() {
    let recorder = Recorder::default();
    let base = serve(carrier_app(recorder.clone())).await;
    let client = CarrierClient::new(&carrier_config(&base), Duration::from_secs(5)).unwrap();

    let quote = client.shipping_fee(&fee_request()).await.unwrap();
    assert_eq!(quote.total, Decimal::from(22_000));
    assert_eq!(quote.insurance_fee, Some(Decimal::from(2_000)));

    let seen = recorder.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers["token"], "ghn-token");
    assert_eq!(seen[0].headers["shop_id"], "885");
    assert_eq!(seen[0].body["insurance_value"], 230_000);
    assert_eq!(seen[0].body["to_ward_code"], "21808");
    assert_eq!(seen[0].body["weight"], 200);
}

#[tokio::test]
async fn carrier_master_data_lookups() {
    let recorder = Recorder::default();
    let base = serve(carrier_app(recorder.clone())).await;
    let client = CarrierClient::new(&carrier_config(&base), Duration::from_secs(5)).unwrap();

    let provinces = client.provinces().await.unwrap();
    assert_eq!(provinces.len(), 2);
    assert_eq!(provinces[0].name, "Hồ Chí Minh");
    let districts = client.districts(202).await.unwrap();
    assert_eq!(districts[0].id, 3695);
    assert!(client.wards(3695).await.unwrap().is_empty());

    let seen = recorder.take();
    assert_eq!(seen[0].headers["token"], "ghn-token");
    assert!(seen[0].headers.get("shop_id").is_none());
    assert_eq!(seen[1].query.get("province_id").map(String::as_str), Some("202"));
}

fn order_request() -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: 7,
        pays_id: 2,
        status: 5,
        products: vec![OrderLine { product_id: ProductId(1), quantity: 2, unit_price: Decimal::from(100_000), discount: Decimal::from(20_000) }],
        shipping_fee: Some(Decimal::from(22_000)),
        voucher_code: None,
        discount: None,
        note: None,
        payment_method: Some(PaymentMethod::Cod),
        idempotency_key: IdempotencyKey::generate(),
    }
}

fn backend_config(base: &str) -> StorefrontConfig {
    let mut config = StorefrontConfig::new(base, CarrierConfig::new("t"));
    config.api_token = Some("jwt-123".into());
    config
}

const ORDER: &str = r#"{"status":"success","orders":{"id":88,"or_date":"2024-11-15 10:00:00","or_total":252000,"or_ship":22000,"or_status":"pending"}}"#;

#[tokio::test]
async fn create_order_accepts_wrapped_and_noisy_bodies() {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/api/create-order", post(|State(r): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>| async move {
            let wrapped = body["products"][0]["soluong"] == 2;
            r.push(Seen { path: "order", headers, query: HashMap::new(), body });
            if wrapped { serde_json::to_string(ORDER).unwrap() } else { format!("Notice: debug\n{ORDER}\n") }
        }))
        .with_state(recorder.clone());
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let request = order_request();
    let placed = client.create_order(&request).await.unwrap();
    assert_eq!(placed.id, 88);
    assert_eq!(placed.or_status, vec!["pending".to_string()]);

    let mut noisy = order_request();
    noisy.products[0].quantity = 1;
    assert_eq!(client.create_order(&noisy).await.unwrap().id, 88);

    let seen = recorder.take();
    assert_eq!(seen[0].headers["idempotency-key"], request.idempotency_key.to_string().as_str());
    assert_eq!(seen[0].headers["authorization"], "Bearer jwt-123");
    assert_eq!(seen[0].body["idempotency_key"], request.idempotency_key.to_string());
    assert_eq!(seen[0].body["shippingFee"], 22_000.0);
    assert_eq!(seen[0].body["paymentMethod"], "cod");
    assert_eq!(seen[0].body["products"][0]["dongia"], 100_000.0);
    assert!(seen[0].body.get("voucher_code").is_none());
}

#[tokio::test]
async fn create_order_rejection_message_is_verbatim() {
    let app = Router::new().route("/api/create-order", post(|| async {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "status": "error", "message": "Sản phẩm đã hết hàng" })))
    }));
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let err = client.create_order(&order_request()).await.unwrap_err();
    assert_eq!(err, CheckoutError::ServerRejected { status: Some(422), message: "Sản phẩm đã hết hàng".into() });
}

#[tokio::test]
async fn create_order_without_order_is_malformed() {
    let app = Router::new().route("/api/create-order", post(|| async { Json(json!({ "status": "success" })) }));
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let err = client.create_order(&order_request()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let err = client.create_order(&order_request()).await.unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}

fn redemption_request() -> RedemptionRequest {
    RedemptionRequest {
        cus_id: 7, name: "5% off, up to 20.000 ₫".into(), cus_points: 25, description: "5% voucher".into(),
        value_max: Decimal::from(20_000), value_min: Decimal::from(100_000), idempotency_key: IdempotencyKey::generate(),
    }
}

#[tokio::test]
async fn redeem_points_reads_balance_and_voucher() {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/api/promotions/redeem-point", post(|State(r): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>| async move {
            r.push(Seen { path: "redeem", headers, query: HashMap::new(), body });
            Json(json!({
                "success": true,
                "data": { "s_code": "RDM5A1", "s_name": "5% off", "s_value_max": "20000", "s_value_min": "100000", "s_end": "2026-12-31", "cus_points": 15 }
            }))
        }))
        .with_state(recorder.clone());
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let request = redemption_request();
    let grant = client.redeem_points(&request).await.unwrap();
    assert_eq!(grant.voucher.s_code, "RDM5A1");
    assert_eq!(grant.remaining_points, Some(15));

    let seen = recorder.take();
    assert_eq!(seen[0].path, "redeem");
    assert_eq!(seen[0].headers["idempotency-key"], request.idempotency_key.to_string().as_str());
    assert_eq!(seen[0].body["cus_points"], 25);
    assert_eq!(seen[0].body["value_max"], 20_000.0);
}

#[tokio::test]
async fn redeem_points_failure_flag_is_rejection() {
    let app = Router::new().route("/api/promotions/redeem-point", post(|| async {
        Json(json!({ "success": false, "message": "Không đủ điểm" })).into_response()
    }));
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let err = client.redeem_points(&redemption_request()).await.unwrap_err();
    assert_eq!(err.user_message(), "Không đủ điểm");
}

#[tokio::test]
async fn customer_vouchers_maps_listing_into_wallet() {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/api/promotions/customer/:id", get(|State(r): State<Recorder>, headers: HeaderMap, Path(id): Path<String>| async move {
            r.push(Seen { path: "vouchers", headers, query: HashMap::from([("id".to_string(), id)]), body: Value::Null });
            serde_json::to_string(&json!({ "success": true, "data": [
                { "id": 1, "code": "XTRA10", "name": "10% off", "discount_percentage": "10", "quantity": "1",
                  "start_date": "2026-01-01", "end_date": "2026-12-31", "max_value": "50000", "min_value": "200000", "catalory": "voucher" },
                { "id": 2, "code": "BROKEN", "name": "bad", "discount_percentage": "150" }
            ]})).unwrap()
        }))
        .with_state(recorder.clone());
    let base = serve(app).await;
    let client = BackendClient::new(&backend_config(&base)).unwrap();

    let vouchers = client.customer_vouchers(7).await.unwrap();
    assert_eq!(vouchers.len(), 1);
    assert_eq!(vouchers[0].code, "XTRA10");
    assert_eq!(vouchers[0].value, VoucherValue::Percent(Percent::whole(10).unwrap()));
    assert_eq!(vouchers[0].min_spend, Money::from_units(200_000));
    assert_eq!(vouchers[0].max_discount, Some(Money::from_units(50_000)));
    assert_eq!(vouchers[0].expires_on.map(|d| d.to_string()).as_deref(), Some("2026-12-31"));

    let seen = recorder.take();
    assert_eq!(seen[0].query.get("id").map(String::as_str), Some("7"));
    assert_eq!(seen[0].headers["authorization"], "Bearer jwt-123");
}
