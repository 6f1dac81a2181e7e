// keyshop/src/store/mod.rs

//! Persistence for users and payments.
//!
//! `fulfill` is the only write on the checkout path and is atomic: the user
//! lookup-or-insert and the payment insert commit together or not at all.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::{AppError, Result};
use crate::models::{NewUser, Payment, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Payment fields supplied by the checkout; the store assigns id, status and
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
  pub amount: i64,
  pub currency: String,
  pub gateway_reference: String,
  pub license_key: String,
}

impl NewPayment {
  pub fn validate(&self) -> Result<()> {
    if self.license_key.trim().is_empty() {
      return Err(AppError::Internal("Refusing to store a payment without a license key.".to_string()));
    }
    if self.amount <= 0 {
      return Err(AppError::Internal("Refusing to store a non-positive payment amount.".to_string()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fulfillment {
  pub user: User,
  pub payment: Payment,
  /// `false` when an existing user with the buyer's email was reused.
  pub user_created: bool,
}

#[async_trait]
pub trait CheckoutStore: Send + Sync {
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

  async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

  /// Inserts a user, failing with `AppError::Conflict` if the email (or the
  /// username) is taken.
  async fn register_user(&self, user: NewUser) -> Result<User>;

  /// Finds the user with `buyer.email` or creates one from `buyer`, then
  /// records `payment` against that user, in one transaction. Creating a
  /// user whose username is taken fails with `AppError::Conflict` and
  /// writes nothing.
  async fn fulfill(&self, buyer: NewUser, payment: NewPayment) -> Result<Fulfillment>;

  async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>>;

  /// Oldest first.
  async fn payments_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;
}
