// keyshop/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub name: String,
  pub username: Option<String>,
  /// Argon2 PHC string. Users created lazily at checkout have none.
  #[serde(skip_serializing, default)]
  pub password_hash: Option<String>,
  pub country: Option<String>,
  pub postcode: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user; ids and timestamps come from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
  pub email: String,
  pub name: String,
  pub username: Option<String>,
  pub password_hash: Option<String>,
  pub country: Option<String>,
  pub postcode: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
}

impl NewUser {
  pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
    User {
      id,
      email: self.email,
      name: self.name,
      username: self.username,
      password_hash: self.password_hash,
      country: self.country,
      postcode: self.postcode,
      address: self.address,
      phone: self.phone,
      created_at: now,
      updated_at: now,
    }
  }
}
