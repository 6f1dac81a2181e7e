// keyshop/src/services/gateway.rs

//! The payment gateway contract: create a charge, confirm it immediately and
//! report the provider's final status.
//!
//! Only a status of exactly `succeeded` counts as paid. Every other status,
//! and any transport or provider fault, ends the checkout with
//! `AppError::PaymentFailed`.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const STATUS_SUCCEEDED: &str = "succeeded";

/// One charge, whichever request shape it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
  /// Minor currency units, always positive.
  pub amount: i64,
  pub currency: String,
  pub payment_method: String,
  pub receipt_email: Option<String>,
  pub description: Option<String>,
}

impl ChargeRequest {
  pub fn validate(&self) -> Result<()> {
    if self.amount <= 0 {
      return Err(AppError::Validation("Amount must be greater than zero.".to_string()));
    }
    if self.currency.trim().is_empty() {
      return Err(AppError::Validation("Currency is required.".to_string()));
    }
    if self.payment_method.trim().is_empty() {
      return Err(AppError::Validation("A payment method is required.".to_string()));
    }
    Ok(())
  }
}

/// What the provider reported for a confirmed charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCharge {
  pub id: String,
  pub status: String,
  pub amount: i64,
  pub currency: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_secret: Option<String>,
}

impl GatewayCharge {
  pub fn is_succeeded(&self) -> bool {
    self.status == STATUS_SUCCEEDED
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &str;

  /// Creates and confirms a charge in one call. `Ok` carries whatever status
  /// the provider settled on; callers decide what counts as paid.
  async fn create_and_confirm(&self, request: &ChargeRequest) -> Result<GatewayCharge>;
}

// --- Stripe ---

#[derive(Debug, Deserialize)]
struct StripeIntent {
  id: String,
  status: String,
  amount: i64,
  currency: String,
  #[serde(default)]
  client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
  error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
  #[serde(default)]
  code: Option<String>,
  #[serde(default)]
  message: Option<String>,
}

/// Stripe PaymentIntents over plain HTTPS with form-encoded bodies.
pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl StripeGateway {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }

  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let key = config
      .stripe_secret_key
      .clone()
      .ok_or_else(|| AppError::Config("STRIPE_SECRET_KEY is required for the stripe gateway".to_string()))?;
    Self::new(config.stripe_api_base.clone(), key)
  }

  fn form_params(request: &ChargeRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("amount", request.amount.to_string()),
      ("currency", request.currency.to_ascii_lowercase()),
      ("payment_method", request.payment_method.clone()),
      ("confirm", "true".to_string()),
      ("automatic_payment_methods[enabled]", "true".to_string()),
      ("automatic_payment_methods[allow_redirects]", "never".to_string()),
    ];
    if let Some(email) = &request.receipt_email {
      params.push(("receipt_email", email.clone()));
    }
    if let Some(description) = &request.description {
      params.push(("description", description.clone()));
    }
    params
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  fn name(&self) -> &str {
    "stripe"
  }

  #[instrument(name = "gateway::stripe", skip(self, request), fields(amount = request.amount, currency = %request.currency))]
  async fn create_and_confirm(&self, request: &ChargeRequest) -> Result<GatewayCharge> {
    let url = format!("{}/v1/payment_intents", self.api_base);
    let resp = self
      .client
      .post(&url)
      .basic_auth(&self.secret_key, Option::<&str>::None)
      .form(&Self::form_params(request))
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, "Stripe request failed.");
        AppError::PaymentFailed(format!("gateway unreachable: {}", e))
      })?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      let detail = serde_json::from_str::<StripeErrorBody>(&body)
        .map(|b| {
          let code = b.error.code.unwrap_or_else(|| "unknown".to_string());
          let message = b.error.message.unwrap_or_default();
          format!("{} ({})", message, code)
        })
        .unwrap_or(body);
      warn!(http_status = %status, %detail, "Stripe rejected the charge.");
      return Err(AppError::PaymentFailed(format!("provider returned {}: {}", status, detail)));
    }

    let intent: StripeIntent = resp
      .json()
      .await
      .map_err(|e| AppError::PaymentFailed(format!("unreadable provider response: {}", e)))?;
    info!(intent_id = %intent.id, status = %intent.status, "Stripe PaymentIntent confirmed.");
    Ok(GatewayCharge {
      id: intent.id,
      status: intent.status,
      amount: intent.amount,
      currency: intent.currency,
      client_secret: intent.client_secret,
    })
  }
}

// --- Mock ---

#[derive(Debug, Clone)]
enum MockScript {
  Status(String),
  Fault(String),
}

/// In-process gateway for local runs and tests. Answers every charge with a
/// scripted status, or a scripted fault, and counts calls.
pub struct MockGateway {
  script: Mutex<MockScript>,
  latency: Duration,
  calls: AtomicUsize,
  last_request: Mutex<Option<ChargeRequest>>,
}

impl MockGateway {
  pub fn with_status(status: impl Into<String>) -> Self {
    Self {
      script: Mutex::new(MockScript::Status(status.into())),
      latency: Duration::ZERO,
      calls: AtomicUsize::new(0),
      last_request: Mutex::new(None),
    }
  }

  pub fn succeeding() -> Self {
    Self::with_status(STATUS_SUCCEEDED)
  }

  /// Every call fails as if the provider could not be reached.
  pub fn faulting(message: impl Into<String>) -> Self {
    let gateway = Self::succeeding();
    *gateway.script.lock() = MockScript::Fault(message.into());
    gateway
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn set_status(&self, status: impl Into<String>) {
    *self.script.lock() = MockScript::Status(status.into());
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_request(&self) -> Option<ChargeRequest> {
    self.last_request.lock().clone()
  }
}

impl Default for MockGateway {
  fn default() -> Self {
    Self::succeeding()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn name(&self) -> &str {
    "mock"
  }

  #[instrument(name = "gateway::mock", skip(self, request), fields(amount = request.amount, currency = %request.currency))]
  async fn create_and_confirm(&self, request: &ChargeRequest) -> Result<GatewayCharge> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_request.lock() = Some(request.clone());
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }

    let script = self.script.lock().clone();
    match script {
      MockScript::Fault(message) => {
        info!(%message, "Mock gateway fault.");
        Err(AppError::PaymentFailed(message))
      }
      MockScript::Status(status) => {
        let id = format!("pi_mock_{}", Uuid::new_v4().simple());
        info!(intent_id = %id, %status, "Mock charge settled.");
        Ok(GatewayCharge {
          client_secret: Some(format!("{}_secret_{}", id, Uuid::new_v4().simple())),
          id,
          status,
          amount: request.amount,
          currency: request.currency.clone(),
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(amount: i64) -> ChargeRequest {
    ChargeRequest {
      amount,
      currency: "usd".to_string(),
      payment_method: "pm_card_visa".to_string(),
      receipt_email: Some("a@b.co".to_string()),
      description: None,
    }
  }

  #[test]
  fn charge_request_requires_positive_amount() {
    assert!(request(1).validate().is_ok());
    assert!(matches!(request(0).validate(), Err(AppError::Validation(_))));
    assert!(matches!(request(-5).validate(), Err(AppError::Validation(_))));
  }

  #[test]
  fn only_exact_succeeded_is_success() {
    let mut charge = GatewayCharge {
      id: "pi_1".to_string(),
      status: "succeeded".to_string(),
      amount: 1,
      currency: "usd".to_string(),
      client_secret: None,
    };
    assert!(charge.is_succeeded());
    for status in ["Succeeded", "succeeded ", "processing", "requires_action", ""] {
      charge.status = status.to_string();
      assert!(!charge.is_succeeded(), "{:?} counted as success", status);
    }
  }

  #[test]
  fn stripe_form_confirms_immediately() {
    let params = StripeGateway::form_params(&request(1999));
    assert!(params.contains(&("amount", "1999".to_string())));
    assert!(params.contains(&("confirm", "true".to_string())));
    assert!(params.contains(&("receipt_email", "a@b.co".to_string())));
    assert!(!params.iter().any(|(k, _)| *k == "description"));
  }

  #[tokio::test]
  async fn mock_gateway_follows_script() {
    let gateway = MockGateway::with_status("requires_payment_method");
    let charge = gateway.create_and_confirm(&request(500)).await.unwrap();
    assert!(!charge.is_succeeded());
    assert_eq!(charge.amount, 500);

    gateway.set_status(STATUS_SUCCEEDED);
    assert!(gateway.create_and_confirm(&request(500)).await.unwrap().is_succeeded());
    assert_eq!(gateway.calls(), 2);
    assert_eq!(gateway.last_request().map(|r| r.amount), Some(500));

    let faulty = MockGateway::faulting("connection reset");
    assert!(matches!(
      faulty.create_and_confirm(&request(500)).await,
      Err(AppError::PaymentFailed(_))
    ));
  }
}
