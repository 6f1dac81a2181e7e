// keyshop/src/store/memory.rs

use crate::errors::{AppError, Result};
use crate::models::{NewUser, Payment, PaymentStatus, User};
use crate::store::{CheckoutStore, Fulfillment, NewPayment};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  user_by_email: HashMap<String, Uuid>,
  payments: Vec<Payment>,
}

impl Tables {
  fn insert_user(&mut self, new_user: NewUser) -> User {
    let user = new_user.into_user(Uuid::new_v4(), Utc::now());
    self.user_by_email.insert(user.email.clone(), user.id);
    self.users.insert(user.id, user.clone());
    user
  }

  fn username_taken(&self, username: &str) -> bool {
    self
      .users
      .values()
      .any(|u| u.username.as_deref() == Some(username))
  }
}

/// Process-local store used by tests and `PAYMENT_GATEWAY=mock` demos.
///
/// One mutex guards both tables, so a fulfillment is a single critical
/// section.
#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn user_count(&self) -> usize {
    self.tables.lock().users.len()
  }

  pub fn payment_count(&self) -> usize {
    self.tables.lock().payments.len()
  }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let tables = self.tables.lock();
    let user = tables.user_by_email.get(email).and_then(|id| tables.users.get(id)).cloned();
    Ok(user)
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.lock().users.get(&id).cloned())
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    Ok(
      self
        .tables
        .lock()
        .users
        .values()
        .find(|u| u.username.as_deref() == Some(username))
        .cloned(),
    )
  }

  async fn register_user(&self, user: NewUser) -> Result<User> {
    let mut tables = self.tables.lock();
    if tables.user_by_email.contains_key(&user.email) {
      return Err(AppError::Conflict("An account with this email or username already exists.".to_string()));
    }
    if let Some(username) = user.username.as_deref() {
      if tables.username_taken(username) {
        return Err(AppError::Conflict("An account with this email or username already exists.".to_string()));
      }
    }
    Ok(tables.insert_user(user))
  }

  async fn fulfill(&self, buyer: NewUser, payment: NewPayment) -> Result<Fulfillment> {
    payment.validate()?;
    let mut tables = self.tables.lock();

    let existing = tables
      .user_by_email
      .get(&buyer.email)
      .and_then(|id| tables.users.get(id))
      .cloned();
    let (user, user_created) = match existing {
      Some(user) => (user, false),
      None => {
        if let Some(username) = buyer.username.as_deref() {
          if tables.username_taken(username) {
            return Err(AppError::Conflict("An account with this username already exists.".to_string()));
          }
        }
        (tables.insert_user(buyer), true)
      }
    };

    let payment = Payment {
      id: Uuid::new_v4(),
      user_id: user.id,
      amount: payment.amount,
      currency: payment.currency,
      status: PaymentStatus::Success,
      gateway_reference: payment.gateway_reference,
      license_key: payment.license_key,
      created_at: Utc::now(),
    };
    tables.payments.push(payment.clone());

    Ok(Fulfillment {
      user,
      payment,
      user_created,
    })
  }

  async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
    Ok(self.tables.lock().payments.iter().find(|p| p.id == id).cloned())
  }

  async fn payments_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
    Ok(
      self
        .tables
        .lock()
        .payments
        .iter()
        .filter(|p| p.user_id == user_id)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn buyer(email: &str) -> NewUser {
    NewUser {
      email: email.to_string(),
      name: "Buyer".to_string(),
      postcode: Some("123456".to_string()),
      ..Default::default()
    }
  }

  fn payment(license: &str) -> NewPayment {
    NewPayment {
      amount: 1999,
      currency: "usd".to_string(),
      gateway_reference: "pi_test".to_string(),
      license_key: license.to_string(),
    }
  }

  #[tokio::test]
  async fn fulfill_creates_then_reuses_user() {
    let store = MemoryStore::new();
    let first = store.fulfill(buyer("a@example.com"), payment("KEY-1")).await.unwrap();
    assert!(first.user_created);
    assert_eq!(first.payment.status, PaymentStatus::Success);
    assert_eq!(first.payment.user_id, first.user.id);

    let second = store.fulfill(buyer("a@example.com"), payment("KEY-2")).await.unwrap();
    assert!(!second.user_created);
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.payments_for_user(first.user.id).await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn empty_license_key_writes_nothing() {
    let store = MemoryStore::new();
    let err = store.fulfill(buyer("a@example.com"), payment("  ")).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(store.user_count(), 0);
    assert_eq!(store.payment_count(), 0);
  }

  #[tokio::test]
  async fn register_rejects_duplicates() {
    let store = MemoryStore::new();
    let mut user = buyer("a@example.com");
    user.username = Some("asha".to_string());
    store.register_user(user.clone()).await.unwrap();

    assert!(matches!(store.register_user(user).await, Err(AppError::Conflict(_))));

    let mut other = buyer("b@example.com");
    other.username = Some("asha".to_string());
    assert!(matches!(store.register_user(other).await, Err(AppError::Conflict(_))));
  }
}
