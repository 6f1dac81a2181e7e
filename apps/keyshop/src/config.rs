// keyshop/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
  Stripe,
  Mock,
}

impl FromStr for GatewayKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "stripe" => Ok(GatewayKind::Stripe),
      "mock" => Ok(GatewayKind::Mock),
      other => Err(AppError::Config(format!("Unknown PAYMENT_GATEWAY '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseMode {
  Placeholder,
  Generated,
}

impl FromStr for LicenseMode {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "placeholder" => Ok(LicenseMode::Placeholder),
      "generated" => Ok(LicenseMode::Generated),
      other => Err(AppError::Config(format!("Unknown LICENSE_MODE '{}'", other))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub run_migrations: bool,

  pub payment_gateway: GatewayKind,
  pub stripe_secret_key: Option<String>,
  pub stripe_api_base: String,
  pub default_currency: String,
  pub default_payment_method: String,
  /// Raw `PRICE_CATALOG` value; parsed by `pricing::PriceCatalog`.
  pub price_catalog: String,

  pub license_mode: LicenseMode,
  pub license_placeholder: String,
}

// Hand-written so the provider secret never reaches a log line.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("run_migrations", &self.run_migrations)
      .field("payment_gateway", &self.payment_gateway)
      .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"))
      .field("stripe_api_base", &self.stripe_api_base)
      .field("default_currency", &self.default_currency)
      .field("default_payment_method", &self.default_payment_method)
      .field("price_catalog", &self.price_catalog)
      .field("license_mode", &self.license_mode)
      .field("license_placeholder", &self.license_placeholder)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process
  /// environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    let require = |key: &str| {
      lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", key)))
    };

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = require("DATABASE_URL")?;
    let run_migrations = get_or("RUN_MIGRATIONS", "true")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;

    let payment_gateway: GatewayKind = get_or("PAYMENT_GATEWAY", "stripe").parse()?;
    let stripe_secret_key = match payment_gateway {
      GatewayKind::Stripe => Some(require("STRIPE_SECRET_KEY")?),
      GatewayKind::Mock => lookup("STRIPE_SECRET_KEY"),
    };
    let stripe_api_base = get_or("STRIPE_API_BASE", "https://api.stripe.com")
      .trim_end_matches('/')
      .to_string();
    let default_currency = get_or("DEFAULT_CURRENCY", "usd").to_ascii_lowercase();
    let default_payment_method = get_or("DEFAULT_PAYMENT_METHOD", "pm_card_visa");
    let price_catalog = get_or("PRICE_CATALOG", "price_basic=1999,price_pro=4999");

    let license_mode: LicenseMode = get_or("LICENSE_MODE", "placeholder").parse()?;
    let license_placeholder = get_or("LICENSE_PLACEHOLDER", "LICENSE-KEY-PLACEHOLDER");
    if license_mode == LicenseMode::Placeholder && license_placeholder.trim().is_empty() {
      return Err(AppError::Config("LICENSE_PLACEHOLDER must not be empty".to_string()));
    }

    let config = Self {
      server_host,
      server_port,
      database_url,
      run_migrations,
      payment_gateway,
      stripe_secret_key,
      stripe_api_base,
      default_currency,
      default_payment_method,
      price_catalog,
      license_mode,
      license_placeholder,
    };
    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
