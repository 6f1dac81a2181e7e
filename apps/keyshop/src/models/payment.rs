// keyshop/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maps to the `payment_status_enum` Postgres type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Success,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Success => "success",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id: Uuid,
  pub user_id: Uuid,
  /// Minor currency units.
  pub amount: i64,
  pub currency: String,
  pub status: PaymentStatus,
  /// The provider's id for the charge (e.g. a PaymentIntent id).
  pub gateway_reference: String,
  pub license_key: String,
  pub created_at: DateTime<Utc>,
}
