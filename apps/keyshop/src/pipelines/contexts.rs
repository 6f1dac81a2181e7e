// keyshop/src/pipelines/contexts.rs

//! Data carried through each flow. Handlers wrap these in `stepwise::Shared`.

use crate::intake::BuyerDetails;
use crate::models::User;
use crate::services::{ChargeRequest, GatewayCharge};
use crate::state::AppState;
use crate::store::Fulfillment;

/// Which request shape started the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutForm {
  /// `/payments/buy`: full buyer details, explicit amount and method.
  Buy,
  /// `/payments/pay`: price id and quantity, name and email only.
  Pay,
}

/// What is being bought, before it is turned into a charge amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
  Amount { amount: i64, currency: Option<String> },
  Price { price_id: String, quantity: i64 },
}

/// Optional credentials sent along with a purchase. Used only when the
/// checkout creates the user.
#[derive(Clone, Default)]
pub struct AccountCredentials {
  pub username: Option<String>,
  pub password: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub form: CheckoutForm,
  pub buyer: BuyerDetails,
  pub credentials: AccountCredentials,
  pub order: OrderSpec,
  pub payment_method: Option<String>,

  // Filled in by the flow:
  pub charge_request: Option<ChargeRequest>,
  pub charge: Option<GatewayCharge>,
  pub license_key: Option<String>,
  pub fulfillment: Option<Fulfillment>,
  pub receipt_logged: bool,
}

impl CheckoutCtxData {
  pub fn new(
    app_state: AppState,
    form: CheckoutForm,
    buyer: BuyerDetails,
    credentials: AccountCredentials,
    order: OrderSpec,
    payment_method: Option<String>,
  ) -> Self {
    Self {
      app_state,
      form,
      buyer,
      credentials,
      order,
      payment_method,
      charge_request: None,
      charge: None,
      license_key: None,
      fulfillment: None,
      receipt_logged: false,
    }
  }
}

#[derive(Clone)]
pub struct RegistrationCtxData {
  pub app_state: AppState,
  pub name: String,
  pub email: String,
  pub username: Option<String>,
  pub password: String,
  pub country: Option<String>,
  pub postcode: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
  pub created_user: Option<User>,
}
