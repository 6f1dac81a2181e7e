// tests/common/mod.rs
#![allow(dead_code)]

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use keyshop::services::{GeneratedIssuer, LicenseIssuer, MockGateway, PaymentGateway, PlaceholderIssuer};
use keyshop::store::{CheckoutStore, MemoryStore};
use keyshop::web::configure_app_routes;
use keyshop::{AppConfig, AppState};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;

pub const PLACEHOLDER_KEY: &str = "LICENSE-KEY-PLACEHOLDER";

pub struct TestShop {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockGateway>,
}

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("DATABASE_URL", "memory"),
    ("PAYMENT_GATEWAY", "mock"),
    ("PRICE_CATALOG", "price_basic=1999,price_pro=4999"),
  ]);
  AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

fn build(gateway: MockGateway, issuer: Arc<dyn LicenseIssuer>) -> TestShop {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(gateway);
  let state = AppState::new(
    test_config(),
    store.clone() as Arc<dyn CheckoutStore>,
    gateway.clone() as Arc<dyn PaymentGateway>,
    issuer,
  )
  .expect("test state");
  TestShop { state, store, gateway }
}

/// Shop whose gateway answers every charge with `status`.
pub fn shop_with_status(status: &str) -> TestShop {
  build(
    MockGateway::with_status(status),
    Arc::new(PlaceholderIssuer::new(PLACEHOLDER_KEY).expect("placeholder")),
  )
}

pub fn shop_with_generated_keys() -> TestShop {
  build(MockGateway::succeeding(), Arc::new(GeneratedIssuer))
}

pub fn shop_with_faulting_gateway() -> TestShop {
  build(
    MockGateway::faulting("connection reset by provider"),
    Arc::new(PlaceholderIssuer::new(PLACEHOLDER_KEY).expect("placeholder")),
  )
}

pub async fn post_json(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(configure_app_routes),
  )
  .await;
  let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
  let resp = test::call_service(&app, req).await;
  let status = resp.status();
  let body: Value = test::read_body_json(resp).await;
  (status, body)
}

pub async fn post_raw(state: &AppState, uri: &str, raw: &'static str) -> (StatusCode, Value) {
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(configure_app_routes),
  )
  .await;
  let req = test::TestRequest::post()
    .uri(uri)
    .insert_header(("content-type", "application/json"))
    .set_payload(raw)
    .to_request();
  let resp = test::call_service(&app, req).await;
  let status = resp.status();
  let body: Value = test::read_body_json(resp).await;
  (status, body)
}

pub async fn get_json(state: &AppState, uri: &str) -> (StatusCode, Value) {
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(configure_app_routes),
  )
  .await;
  let req = test::TestRequest::get().uri(uri).to_request();
  let resp = test::call_service(&app, req).await;
  let status = resp.status();
  let body: Value = test::read_body_json(resp).await;
  (status, body)
}

/// A complete `/payments/buy` body for `email`.
pub fn buy_body(email: &str, postcode: &str) -> Value {
  serde_json::json!({
    "name": "Asha Rao",
    "email": email,
    "country": "IN",
    "postcode": postcode,
    "address": "12 MG Road",
    "amount": 1999,
    "currency": "usd",
    "paymentMethodId": "pm_card_visa",
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
