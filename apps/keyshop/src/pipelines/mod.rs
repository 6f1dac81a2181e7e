// keyshop/src/pipelines/mod.rs

//! Flows run by the HTTP handlers, one per context type.

use crate::errors::AppError;
use stepwise::FlowRegistry;

pub mod checkout_pipeline;
pub mod contexts;
pub mod registration_pipeline;

/// Registers every flow. Called once while building `AppState`.
pub fn register_all_flows(registry: &FlowRegistry<AppError>) {
  registry.register(checkout_pipeline::checkout_flow());
  registry.register(registration_pipeline::registration_flow());
  tracing::info!(flows = registry.len(), "Flows registered.");
}
