// keyshop/src/services/license.rs

//! License tokens handed out on a successful purchase.
//!
//! The token is opaque to the shop; issuers only promise a non-empty string.

use crate::config::{AppConfig, LicenseMode};
use crate::errors::{AppError, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Who the license is for. Issuers may ignore any of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
  pub email: String,
  pub amount: i64,
  pub gateway_reference: String,
}

pub trait LicenseIssuer: Send + Sync {
  fn issue(&self, request: &LicenseRequest) -> Result<String>;
}

/// Hands out the same configured token every time.
#[derive(Debug, Clone)]
pub struct PlaceholderIssuer {
  token: String,
}

impl PlaceholderIssuer {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    let token = token.into();
    if token.trim().is_empty() {
      return Err(AppError::Config("License placeholder must not be empty".to_string()));
    }
    Ok(Self { token })
  }
}

impl LicenseIssuer for PlaceholderIssuer {
  fn issue(&self, _request: &LicenseRequest) -> Result<String> {
    Ok(self.token.clone())
  }
}

/// Random `XXXX-XXXX-XXXX-XXXX` tokens cut from a v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedIssuer;

impl GeneratedIssuer {
  pub fn generate() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}-{}-{}", &hex[0..4], &hex[4..8], &hex[8..12], &hex[12..16])
  }
}

impl LicenseIssuer for GeneratedIssuer {
  fn issue(&self, _request: &LicenseRequest) -> Result<String> {
    Ok(Self::generate())
  }
}

pub fn issuer_from_config(config: &AppConfig) -> Result<Arc<dyn LicenseIssuer>> {
  Ok(match config.license_mode {
    LicenseMode::Placeholder => Arc::new(PlaceholderIssuer::new(config.license_placeholder.clone())?),
    LicenseMode::Generated => Arc::new(GeneratedIssuer),
  })
}
