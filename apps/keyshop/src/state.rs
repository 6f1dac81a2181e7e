// keyshop/src/state.rs

use crate::config::{AppConfig, GatewayKind};
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::pricing::PriceCatalog;
use crate::services::license::{self, LicenseIssuer};
use crate::services::{MockGateway, PaymentGateway, StripeGateway};
use crate::store::CheckoutStore;
use std::sync::Arc;
use stepwise::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub store: Arc<dyn CheckoutStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub license_issuer: Arc<dyn LicenseIssuer>,
  pub prices: Arc<PriceCatalog>,
  pub flows: Arc<FlowRegistry<AppError>>,
}

impl AppState {
  /// Wires the given collaborators together and registers the flows.
  pub fn new(
    config: AppConfig,
    store: Arc<dyn CheckoutStore>,
    gateway: Arc<dyn PaymentGateway>,
    license_issuer: Arc<dyn LicenseIssuer>,
  ) -> Result<Self> {
    let prices = PriceCatalog::parse(&config.price_catalog)?;
    let flows = FlowRegistry::<AppError>::new();
    pipelines::register_all_flows(&flows);
    Ok(Self {
      config: Arc::new(config),
      store,
      gateway,
      license_issuer,
      prices: Arc::new(prices),
      flows: Arc::new(flows),
    })
  }

  /// Picks the gateway and license issuer named in `config`.
  pub fn from_config(config: AppConfig, store: Arc<dyn CheckoutStore>) -> Result<Self> {
    let gateway: Arc<dyn PaymentGateway> = match config.payment_gateway {
      GatewayKind::Stripe => Arc::new(StripeGateway::from_config(&config)?),
      GatewayKind::Mock => {
        tracing::warn!("Using the mock payment gateway; no real charges will be made.");
        Arc::new(MockGateway::succeeding())
      }
    };
    let issuer = license::issuer_from_config(&config)?;
    Self::new(config, store, gateway, issuer)
  }
}
