// tests/stripe_gateway_tests.rs
mod common;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use common::*;
use keyshop::errors::AppError;
use keyshop::services::{ChargeRequest, PaymentGateway, PlaceholderIssuer, StripeGateway};
use keyshop::store::{CheckoutStore, MemoryStore};
use keyshop::AppState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Captured {
  authorization: Option<String>,
  form: HashMap<String, String>,
}

/// Local stand-in for the PaymentIntents endpoint. Answers every request with
/// `status` and `body` and records what it was sent.
struct StubProvider {
  base: String,
  captured: Arc<Mutex<Vec<Captured>>>,
  handle: ServerHandle,
}

impl StubProvider {
  async fn start(status: u16, body: &'static str) -> Self {
    setup_tracing();
    let captured: Arc<Mutex<Vec<Captured>>> = Arc::default();
    let seen = captured.clone();
    let server = HttpServer::new(move || {
      let seen = seen.clone();
      App::new().route(
        "/v1/payment_intents",
        web::post().to(move |req: HttpRequest, form: web::Form<HashMap<String, String>>| {
          let seen = seen.clone();
          async move {
            seen.lock().push(Captured {
              authorization: req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
              form: form.into_inner(),
            });
            HttpResponse::build(StatusCode::from_u16(status).unwrap())
              .content_type("application/json")
              .body(body)
          }
        }),
      )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind stub provider");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Self {
      base: format!("http://{}", addr),
      captured,
      handle,
    }
  }

  fn gateway(&self) -> StripeGateway {
    StripeGateway::new(&self.base, "sk_test_keyshop").unwrap()
  }

  fn requests(&self) -> Vec<Captured> {
    self.captured.lock().clone()
  }

  async fn stop(self) {
    self.handle.stop(true).await;
  }
}

fn charge() -> ChargeRequest {
  ChargeRequest {
    amount: 1999,
    currency: "USD".to_string(),
    payment_method: "pm_card_visa".to_string(),
    receipt_email: Some("asha@example.com".to_string()),
    description: None,
  }
}

const SUCCEEDED: &str =
  r#"{"id":"pi_123","object":"payment_intent","status":"succeeded","amount":1999,"currency":"usd","client_secret":"pi_123_secret"}"#;
const REQUIRES_ACTION: &str =
  r#"{"id":"pi_456","object":"payment_intent","status":"requires_action","amount":1999,"currency":"usd"}"#;
const DECLINED: &str =
  r#"{"error":{"type":"card_error","code":"card_declined","message":"Your card was declined."}}"#;

#[actix_web::test]
async fn confirmed_intent_is_reported_with_its_status() {
  let provider = StubProvider::start(200, SUCCEEDED).await;
  let charge_result = provider.gateway().create_and_confirm(&charge()).await.unwrap();

  assert!(charge_result.is_succeeded());
  assert_eq!(charge_result.id, "pi_123");
  assert_eq!(charge_result.amount, 1999);
  assert_eq!(charge_result.client_secret.as_deref(), Some("pi_123_secret"));

  let requests = provider.requests();
  assert_eq!(requests.len(), 1);
  let sent = &requests[0];
  assert!(sent.authorization.as_deref().unwrap_or_default().starts_with("Basic "));
  assert_eq!(sent.form["amount"], "1999");
  assert_eq!(sent.form["currency"], "usd");
  assert_eq!(sent.form["payment_method"], "pm_card_visa");
  assert_eq!(sent.form["confirm"], "true");
  assert_eq!(sent.form["automatic_payment_methods[allow_redirects]"], "never");
  assert_eq!(sent.form["receipt_email"], "asha@example.com");
  assert!(!sent.form.contains_key("description"));
  provider.stop().await;
}

#[actix_web::test]
async fn intent_needing_action_is_not_succeeded() {
  let provider = StubProvider::start(200, REQUIRES_ACTION).await;
  let charge_result = provider.gateway().create_and_confirm(&charge()).await.unwrap();
  assert_eq!(charge_result.status, "requires_action");
  assert!(!charge_result.is_succeeded());
  provider.stop().await;
}

#[actix_web::test]
async fn checkout_against_provider_needing_action_records_nothing() {
  let provider = StubProvider::start(200, REQUIRES_ACTION).await;
  let store = Arc::new(MemoryStore::new());
  let state = AppState::new(
    test_config(),
    store.clone() as Arc<dyn CheckoutStore>,
    Arc::new(provider.gateway()) as Arc<dyn PaymentGateway>,
    Arc::new(PlaceholderIssuer::new(PLACEHOLDER_KEY).unwrap()),
  )
  .unwrap();

  let (status, body) = post_json(&state, "/api/payments/buy", buy_body("asha@example.com", "123456")).await;
  assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
  assert_eq!(body["success"], false);
  assert_eq!(provider.requests().len(), 1);
  assert_eq!(store.user_count(), 0);
  assert_eq!(store.payment_count(), 0);
  provider.stop().await;
}

#[actix_web::test]
async fn provider_decline_is_payment_failed_with_its_code() {
  let provider = StubProvider::start(402, DECLINED).await;
  let err = provider.gateway().create_and_confirm(&charge()).await.unwrap_err();
  match err {
    AppError::PaymentFailed(detail) => {
      assert!(detail.contains("card_declined"), "detail: {}", detail);
      assert!(detail.contains("402"), "detail: {}", detail);
    }
    other => panic!("expected PaymentFailed, got {:?}", other),
  }
  provider.stop().await;
}

#[actix_web::test]
async fn unreadable_success_body_is_payment_failed() {
  let provider = StubProvider::start(200, "<html>maintenance</html>").await;
  let err = provider.gateway().create_and_confirm(&charge()).await.unwrap_err();
  assert!(matches!(err, AppError::PaymentFailed(_)), "got {:?}", err);
  provider.stop().await;
}

#[actix_web::test]
async fn unreachable_provider_is_payment_failed() {
  setup_tracing();
  let gateway = StripeGateway::new("http://127.0.0.1:1", "sk_test_keyshop").unwrap();
  let err = gateway.create_and_confirm(&charge()).await.unwrap_err();
  assert!(matches!(err, AppError::PaymentFailed(_)), "got {:?}", err);
}
