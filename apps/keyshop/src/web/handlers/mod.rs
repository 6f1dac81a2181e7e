// keyshop/src/web/handlers/mod.rs

pub mod payment_handlers;
pub mod user_handlers;
