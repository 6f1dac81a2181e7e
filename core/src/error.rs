// stepwise/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the engine itself, as opposed to errors returned by hooks.
///
/// Application error types embed this through `From<FlowError>` so that a
/// misconfigured flow surfaces through the same channel as business errors.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Unknown step '{step}' in flow '{flow}'")]
  UnknownStep { flow: String, step: String },

  #[error("Step '{step}' already declared in flow '{flow}'")]
  DuplicateStep { flow: String, step: String },

  #[error("Required step '{step}' in flow '{flow}' has no hooks")]
  MissingHandler { flow: String, step: String },

  #[error("No flow registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context handed to flow '{flow}' is not a Shared<{expected}>")]
  ContextMismatch { flow: String, expected: String },

  #[error("Hook failed: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(source: AnyhowError) -> Self {
    FlowError::Handler { source }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
