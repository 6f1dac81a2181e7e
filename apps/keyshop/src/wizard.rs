// keyshop/src/wizard.rs

//! The buyer-facing two-step checkout form, as a state machine.
//!
//! Step one collects identity and address fields and passes only name and
//! email forward. Step two collects a price id and quantity and produces the
//! `/api/payments/pay` request. The result is shown as one alert.

use crate::models::Payment;
use crate::services::GatewayCharge;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
  Details,
  Payment,
  Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
  #[error("Please fill in: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("Quantity must be a whole number of at least 1")]
  InvalidQuantity,

  #[error("Action not available on the {0:?} step")]
  WrongStep(WizardStep),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsForm {
  pub name: String,
  pub email: String,
  pub country: String,
  pub postcode: String,
  pub address: String,
  pub phone: String,
}

impl DetailsForm {
  /// Required fields left blank, in form order.
  pub fn missing_required(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.name.trim().is_empty() {
      missing.push("name");
    }
    if self.email.trim().is_empty() {
      missing.push("email");
    }
    missing
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
  pub price_id: String,
  /// As typed into the quantity input.
  pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
  pub price_id: String,
  pub quantity: i64,
  pub name: String,
  pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
  pub success: bool,
  pub payment_intent: GatewayCharge,
  pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
  Success(String),
  Failure(String),
}

impl Alert {
  pub fn is_success(&self) -> bool {
    matches!(self, Alert::Success(_))
  }

  pub fn message(&self) -> &str {
    match self {
      Alert::Success(m) | Alert::Failure(m) => m,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Carried {
  name: String,
  email: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutWizard {
  step: WizardStep,
  carried: Option<Carried>,
  alert: Option<Alert>,
}

impl Default for CheckoutWizard {
  fn default() -> Self {
    Self::new()
  }
}

impl CheckoutWizard {
  pub fn new() -> Self {
    Self {
      step: WizardStep::Details,
      carried: None,
      alert: None,
    }
  }

  pub fn step(&self) -> WizardStep {
    self.step
  }

  pub fn alert(&self) -> Option<&Alert> {
    self.alert.as_ref()
  }

  /// The payment step is shown only once name and email were carried over.
  pub fn shows_payment_step(&self) -> bool {
    self.step == WizardStep::Payment && self.carried.is_some()
  }

  /// Name and email handed to step two, if step one was submitted.
  pub fn carried_identity(&self) -> Option<(&str, &str)> {
    self.carried.as_ref().map(|c| (c.name.as_str(), c.email.as_str()))
  }

  pub fn submit_details(&mut self, form: &DetailsForm) -> Result<(), WizardError> {
    if self.step != WizardStep::Details {
      return Err(WizardError::WrongStep(self.step));
    }
    let missing = form.missing_required();
    if !missing.is_empty() {
      return Err(WizardError::MissingFields(missing));
    }
    self.carried = Some(Carried {
      name: form.name.trim().to_string(),
      email: form.email.trim().to_string(),
    });
    self.step = WizardStep::Payment;
    debug!("Wizard moved to the payment step.");
    Ok(())
  }

  /// Returns to step one; the carried identity is dropped.
  pub fn back(&mut self) {
    self.step = WizardStep::Details;
    self.carried = None;
    self.alert = None;
  }

  pub fn pay_request(&self, form: &PaymentForm) -> Result<PayRequest, WizardError> {
    let carried = match (&self.carried, self.step) {
      (Some(carried), WizardStep::Payment) => carried,
      _ => return Err(WizardError::WrongStep(self.step)),
    };
    let mut missing = Vec::new();
    if form.price_id.trim().is_empty() {
      missing.push("priceId");
    }
    if form.quantity.trim().is_empty() {
      missing.push("quantity");
    }
    if !missing.is_empty() {
      return Err(WizardError::MissingFields(missing));
    }
    let quantity = form
      .quantity
      .trim()
      .parse::<i64>()
      .ok()
      .filter(|q| *q >= 1)
      .ok_or(WizardError::InvalidQuantity)?;

    Ok(PayRequest {
      price_id: form.price_id.trim().to_string(),
      quantity,
      name: carried.name.clone(),
      email: carried.email.clone(),
    })
  }

  /// Records the outcome of the payment call as the single alert. Only a
  /// wizard waiting on step two with a carried identity can finish.
  pub fn finish(&mut self, alert: Alert) -> Result<&Alert, WizardError> {
    if self.step != WizardStep::Payment || self.carried.is_none() {
      return Err(WizardError::WrongStep(self.step));
    }
    self.step = WizardStep::Done;
    Ok(self.alert.insert(alert))
  }
}

/// Posts wizard requests to a running keyshop server.
pub struct WizardClient {
  client: reqwest::Client,
  base_url: String,
}

impl WizardClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  /// Sends the payment request; any failure, including transport errors,
  /// becomes a failure alert.
  #[instrument(name = "WizardClient::pay", skip(self, request), fields(price_id = %request.price_id))]
  pub async fn pay(&self, request: &PayRequest) -> Alert {
    let url = format!("{}/api/payments/pay", self.base_url);
    let resp = match self.client.post(&url).json(request).send().await {
      Ok(resp) => resp,
      Err(e) => {
        warn!(error = %e, "Payment request did not reach the server.");
        return Alert::Failure(format!("Payment failed: {}", e));
      }
    };

    if resp.status().is_success() {
      match resp.json::<PayResponse>().await {
        Ok(body) if body.success => Alert::Success(format!(
          "Payment successful! Your license key: {}",
          body.payment.license_key
        )),
        Ok(_) => Alert::Failure("Payment failed.".to_string()),
        Err(e) => Alert::Failure(format!("Payment failed: unreadable response ({})", e)),
      }
    } else {
      let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| "Payment failed.".to_string());
      Alert::Failure(message)
    }
  }

  /// Builds the request from the wizard's state, sends it and records the
  /// alert on the wizard.
  pub async fn submit<'w>(&self, wizard: &'w mut CheckoutWizard, form: &PaymentForm) -> Result<&'w Alert, WizardError> {
    let request = wizard.pay_request(form)?;
    let alert = self.pay(&request).await;
    wizard.finish(alert)
  }
}
