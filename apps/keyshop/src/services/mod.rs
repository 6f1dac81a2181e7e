// keyshop/src/services/mod.rs

pub mod auth_service;
pub mod gateway;
pub mod license;

pub use gateway::{ChargeRequest, GatewayCharge, MockGateway, PaymentGateway, StripeGateway};
pub use license::{GeneratedIssuer, LicenseIssuer, LicenseRequest, PlaceholderIssuer};
