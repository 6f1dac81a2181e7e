// keyshop/src/lib.rs

//! Checkout service for software licenses: intake validation, a gateway
//! charge, and an atomic fulfillment that records the buyer and a payment
//! carrying the issued license key.

pub mod config;
pub mod errors;
pub mod intake;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
pub mod wizard;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
