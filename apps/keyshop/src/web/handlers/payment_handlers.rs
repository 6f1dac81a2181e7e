// keyshop/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use stepwise::{Outcome, Shared};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::intake::BuyerDetails;
use crate::pipelines::contexts::{AccountCredentials, CheckoutCtxData, CheckoutForm, OrderSpec};
use crate::services::GatewayCharge;
use crate::state::AppState;
use crate::store::Fulfillment;

// --- Request DTOs ---

/// Body of `POST /api/payments/buy`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequestPayload {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub username: Option<String>,
  #[serde(default)]
  pub password: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub postcode: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  pub amount: i64,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub payment_method_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CustomerDetails {
  pub name: String,
  pub email: String,
}

/// Body of `POST /api/payments/pay`. Customer details come either nested
/// under `customerDetails` or flat, as the wizard sends them.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PayRequestPayload {
  pub price_id: String,
  pub quantity: i64,
  #[serde(default)]
  pub payment_method_id: Option<String>,
  #[serde(default)]
  pub customer_details: Option<CustomerDetails>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub postcode: Option<String>,
}

impl PayRequestPayload {
  fn customer(&self) -> Result<CustomerDetails> {
    if let Some(details) = &self.customer_details {
      return Ok(details.clone());
    }
    match (&self.name, &self.email) {
      (Some(name), Some(email)) => Ok(CustomerDetails {
        name: name.clone(),
        email: email.clone(),
      }),
      _ => Err(AppError::Validation("Customer name and email are required.".to_string())),
    }
  }
}

// --- Checkout runner ---

/// Runs the checkout flow and returns the settled charge and what was stored.
async fn run_checkout(app_state: &AppState, ctx_data: CheckoutCtxData) -> Result<(GatewayCharge, Fulfillment)> {
  let ctx = Shared::new(ctx_data);
  let outcome = app_state.flows.run(ctx.clone()).await?;

  let guard = ctx.read();
  match outcome {
    Outcome::Completed => {
      let charge = guard
        .charge
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout completed without a charge.".to_string()))?;
      let fulfillment = guard
        .fulfillment
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout completed without fulfillment.".to_string()))?;
      Ok((charge, fulfillment))
    }
    Outcome::Halted => {
      let status = guard
        .charge
        .as_ref()
        .map(|c| c.status.clone())
        .unwrap_or_else(|| "none".to_string());
      warn!(%status, "Checkout halted; payment not recorded.");
      Err(AppError::PaymentFailed(format!("gateway status '{}'", status)))
    }
  }
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::buy",
  skip(app_state, req_payload),
  fields(req_email = %req_payload.email, amount = req_payload.amount)
)]
pub async fn buy_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<BuyRequestPayload>,
) -> Result<HttpResponse> {
  let req = req_payload.into_inner();
  let ctx_data = CheckoutCtxData::new(
    app_state.get_ref().clone(),
    CheckoutForm::Buy,
    BuyerDetails {
      name: req.name,
      email: req.email,
      country: req.country,
      postcode: req.postcode,
      address: req.address,
      phone: req.phone,
    },
    AccountCredentials {
      username: req.username,
      password: req.password,
    },
    OrderSpec::Amount {
      amount: req.amount,
      currency: req.currency,
    },
    req.payment_method_id,
  );

  let (_charge, fulfillment) = run_checkout(&app_state, ctx_data).await?;
  info!(payment_id = %fulfillment.payment.id, "Purchase recorded.");
  Ok(HttpResponse::Created().json(fulfillment.payment))
}

#[instrument(
  name = "handler::pay",
  skip(app_state, req_payload),
  fields(price_id = %req_payload.price_id, quantity = req_payload.quantity)
)]
pub async fn pay_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PayRequestPayload>,
) -> Result<HttpResponse> {
  let req = req_payload.into_inner();
  let customer = req.customer()?;
  let ctx_data = CheckoutCtxData::new(
    app_state.get_ref().clone(),
    CheckoutForm::Pay,
    BuyerDetails {
      name: customer.name,
      email: customer.email,
      postcode: req.postcode,
      ..Default::default()
    },
    AccountCredentials::default(),
    OrderSpec::Price {
      price_id: req.price_id,
      quantity: req.quantity,
    },
    req.payment_method_id,
  );

  let (charge, fulfillment) = run_checkout(&app_state, ctx_data).await?;
  info!(payment_id = %fulfillment.payment.id, "Payment recorded.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "paymentIntent": charge,
    "payment": fulfillment.payment,
  })))
}

#[instrument(name = "handler::get_payment", skip(app_state))]
pub async fn get_payment_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let payment_id = path.into_inner();
  let payment = app_state
    .store
    .find_payment(payment_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Payment {} not found.", payment_id)))?;
  Ok(HttpResponse::Ok().json(payment))
}
