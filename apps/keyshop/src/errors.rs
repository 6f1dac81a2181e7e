// keyshop/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stepwise::FlowError;
use thiserror::Error;

/// Message shown to the buyer whenever a charge does not come back `succeeded`.
pub const PAYMENT_FAILED: &str = "Payment Failed";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  /// The gateway answered with a non-success status, or failed outright.
  #[error("{}: {0}", PAYMENT_FAILED)]
  PaymentFailed(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Database Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("HTTP Client Error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// The user-facing message. Store and provider internals never leak here.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::NotFound(m) | AppError::Conflict(m) => m.clone(),
      AppError::PaymentFailed(_) => PAYMENT_FAILED.to_string(),
      AppError::Config(_) => "Service configuration error".to_string(),
      AppError::Sqlx(_) | AppError::Migrate(_) => "Database operation failed".to_string(),
      AppError::Http(_) => "Upstream service unavailable".to_string(),
      AppError::Workflow { .. } | AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Http(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migrate(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "success": false,
      "error": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
