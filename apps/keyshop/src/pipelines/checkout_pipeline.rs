// keyshop/src/pipelines/checkout_pipeline.rs

//! intake → price → charge → license → fulfill → receipt.
//!
//! Nothing is written before the gateway reports `succeeded`. A charge with
//! any other status halts the run after `charge_gateway`; the handler turns
//! that halt into `Payment Failed`.

use crate::errors::{AppError, Result};
use crate::intake::{self, BuyerDetails};
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutForm, OrderSpec};
use crate::services::auth_service;
use crate::services::{ChargeRequest, LicenseRequest};
use crate::store::NewPayment;
use stepwise::{Control, Flow, Shared};
use tracing::{event, info, warn, Level};

pub const VALIDATE_INTAKE: &str = "validate_intake";
pub const PRICE_ORDER: &str = "price_order";
pub const CHARGE_GATEWAY: &str = "charge_gateway";
pub const ISSUE_LICENSE: &str = "issue_license";
pub const FULFILL_ORDER: &str = "fulfill_order";
pub const LOG_RECEIPT: &str = "log_receipt";

pub fn checkout_flow() -> Flow<CheckoutCtxData, AppError> {
  let mut flow = Flow::new("checkout")
    .step(VALIDATE_INTAKE)
    .step(PRICE_ORDER)
    .step(CHARGE_GATEWAY)
    .step(ISSUE_LICENSE)
    .step(FULFILL_ORDER)
    .optional_step(LOG_RECEIPT);

  flow.on(VALIDATE_INTAKE, validate_intake);
  flow.on(PRICE_ORDER, price_order);
  flow.on(CHARGE_GATEWAY, charge_gateway);
  flow.after(CHARGE_GATEWAY, halt_unless_succeeded);
  flow.on(ISSUE_LICENSE, issue_license);
  flow.on(FULFILL_ORDER, fulfill_order);
  flow.on(LOG_RECEIPT, log_receipt);
  flow
}

async fn validate_intake(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let (app_state, buyer, form, credentials) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.buyer.clone(), guard.form, guard.credentials.clone())
  };

  let buyer: BuyerDetails = buyer.normalized();
  intake::validate_buyer(&buyer, form == CheckoutForm::Buy)?;
  if let Some(password) = credentials.password.as_deref() {
    if password.len() < auth_service::MIN_PASSWORD_LEN {
      return Err(AppError::Validation(format!(
        "Password must be at least {} characters long.",
        auth_service::MIN_PASSWORD_LEN
      )));
    }
  }

  // Usernames held by another email are refused before the charge.
  let username = credentials.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
  if let Some(name) = username.as_deref() {
    if let Some(holder) = app_state.store.find_user_by_username(name).await? {
      if holder.email != buyer.email {
        return Err(AppError::Conflict("An account with this username already exists.".to_string()));
      }
    }
  }

  event!(Level::DEBUG, email = %buyer.email, ?form, "Intake accepted.");
  let mut guard = ctx.write();
  guard.buyer = buyer;
  guard.credentials.username = username;
  Ok(Control::Proceed)
}

async fn price_order(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let (app_state, order, payment_method, email) = {
    let guard = ctx.read();
    (
      guard.app_state.clone(),
      guard.order.clone(),
      guard.payment_method.clone(),
      guard.buyer.email.clone(),
    )
  };
  let config = &app_state.config;

  let (amount, currency, description) = match order {
    OrderSpec::Amount { amount, currency } => (
      amount,
      currency
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| config.default_currency.clone()),
      None,
    ),
    OrderSpec::Price { price_id, quantity } => {
      let amount = app_state.prices.quote(&price_id, quantity)?;
      (
        amount,
        config.default_currency.clone(),
        Some(format!("{} x {}", quantity, price_id)),
      )
    }
  };

  let request = ChargeRequest {
    amount,
    currency,
    payment_method: payment_method
      .map(|m| m.trim().to_string())
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| config.default_payment_method.clone()),
    receipt_email: Some(email),
    description,
  };
  request.validate()?;

  info!(amount = request.amount, currency = %request.currency, "Order priced.");
  ctx.write().charge_request = Some(request);
  Ok(Control::Proceed)
}

async fn charge_gateway(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let (gateway, request) = {
    let guard = ctx.read();
    (guard.app_state.gateway.clone(), guard.charge_request.clone())
  };
  let request = request.ok_or_else(|| AppError::Internal("Charge requested before pricing.".to_string()))?;

  let charge = gateway.create_and_confirm(&request).await?;
  info!(gateway = gateway.name(), charge_id = %charge.id, status = %charge.status, "Gateway answered.");
  ctx.write().charge = Some(charge);
  Ok(Control::Proceed)
}

async fn halt_unless_succeeded(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let guard = ctx.read();
  match guard.charge.as_ref() {
    Some(charge) if charge.is_succeeded() => Ok(Control::Proceed),
    Some(charge) => {
      warn!(charge_id = %charge.id, status = %charge.status, "Charge did not succeed; nothing will be recorded.");
      Ok(Control::Halt)
    }
    None => Err(AppError::Internal("Gateway step finished without a charge.".to_string())),
  }
}

async fn issue_license(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let (issuer, request) = {
    let guard = ctx.read();
    let charge = guard
      .charge
      .as_ref()
      .ok_or_else(|| AppError::Internal("License requested before a charge.".to_string()))?;
    (
      guard.app_state.license_issuer.clone(),
      LicenseRequest {
        email: guard.buyer.email.clone(),
        amount: charge.amount,
        gateway_reference: charge.id.clone(),
      },
    )
  };

  let key = issuer.issue(&request)?;
  if key.trim().is_empty() {
    return Err(AppError::Internal("License issuer returned an empty key.".to_string()));
  }
  ctx.write().license_key = Some(key);
  Ok(Control::Proceed)
}

async fn fulfill_order(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let (store, buyer, credentials, charge, license_key) = {
    let guard = ctx.read();
    (
      guard.app_state.store.clone(),
      guard.buyer.clone(),
      guard.credentials.clone(),
      guard.charge.clone(),
      guard.license_key.clone(),
    )
  };
  let charge = charge.ok_or_else(|| AppError::Internal("Fulfillment without a charge.".to_string()))?;
  let license_key = license_key.ok_or_else(|| AppError::Internal("Fulfillment without a license.".to_string()))?;

  let mut new_user = buyer.to_new_user();
  new_user.username = credentials.username;
  if let Some(password) = credentials.password.as_deref() {
    new_user.password_hash = Some(auth_service::hash_password(password)?);
  }

  let fulfillment = store
    .fulfill(
      new_user,
      NewPayment {
        amount: charge.amount,
        currency: charge.currency.clone(),
        gateway_reference: charge.id.clone(),
        license_key,
      },
    )
    .await?;

  info!(
    payment_id = %fulfillment.payment.id,
    user_id = %fulfillment.user.id,
    user_created = fulfillment.user_created,
    "Order fulfilled."
  );
  ctx.write().fulfillment = Some(fulfillment);
  Ok(Control::Proceed)
}

async fn log_receipt(ctx: Shared<CheckoutCtxData>) -> Result<Control> {
  let mut guard = ctx.write();
  let fulfillment = guard
    .fulfillment
    .as_ref()
    .ok_or_else(|| AppError::Internal("No fulfillment to report.".to_string()))?;
  info!(
    email = %fulfillment.user.email,
    payment_id = %fulfillment.payment.id,
    amount = fulfillment.payment.amount,
    currency = %fulfillment.payment.currency,
    "Receipt: license issued."
  );
  guard.receipt_logged = true;
  Ok(Control::Proceed)
}
