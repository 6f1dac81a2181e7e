// keyshop/src/models/mod.rs

//! Rows of the two tables the service owns.

pub mod payment;
pub mod user;

pub use payment::{Payment, PaymentStatus};
pub use user::{NewUser, User};
