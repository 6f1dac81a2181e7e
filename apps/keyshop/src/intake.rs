// keyshop/src/intake.rs

//! Buyer fields collected by the checkout form, and the checks run on them
//! before any money moves.

use crate::errors::{AppError, Result};
use crate::models::NewUser;
use serde::{Deserialize, Serialize};

pub const POSTCODE_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDetails {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub postcode: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

impl BuyerDetails {
  /// Trims every field and drops optional ones that end up empty.
  pub fn normalized(self) -> Self {
    fn clean(v: Option<String>) -> Option<String> {
      v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }
    Self {
      name: self.name.trim().to_string(),
      email: self.email.trim().to_ascii_lowercase(),
      country: clean(self.country),
      postcode: clean(self.postcode),
      address: clean(self.address),
      phone: clean(self.phone),
    }
  }

  /// Profile for a user created lazily at checkout: no credentials.
  pub fn to_new_user(&self) -> NewUser {
    NewUser {
      email: self.email.clone(),
      name: self.name.clone(),
      username: None,
      password_hash: None,
      country: self.country.clone(),
      postcode: self.postcode.clone(),
      address: self.address.clone(),
      phone: self.phone.clone(),
    }
  }
}

/// A postcode is accepted only when it is exactly six characters long.
pub fn validate_postcode(postcode: &str) -> Result<()> {
  let len = postcode.trim().chars().count();
  if len != POSTCODE_LEN {
    return Err(AppError::Validation(format!(
      "Postcode must be exactly {} characters (got {}).",
      POSTCODE_LEN, len
    )));
  }
  Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
  let email = email.trim();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(AppError::Validation("A valid email is required.".to_string())),
  }
}

/// Checks a buyer before the charge.
///
/// `postcode_required` is set for the full purchase form; the short price-id
/// form only carries name and email, and there the postcode is checked only
/// when one was sent.
pub fn validate_buyer(buyer: &BuyerDetails, postcode_required: bool) -> Result<()> {
  if buyer.name.trim().is_empty() {
    return Err(AppError::Validation("Name is required.".to_string()));
  }
  validate_email(&buyer.email)?;
  match buyer.postcode.as_deref() {
    Some(postcode) => validate_postcode(postcode),
    None if postcode_required => Err(AppError::Validation("Postcode is required.".to_string())),
    None => Ok(()),
  }
}
