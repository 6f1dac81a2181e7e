// keyshop/src/pipelines/registration_pipeline.rs

use crate::errors::{AppError, Result};
use crate::intake;
use crate::models::NewUser;
use crate::pipelines::contexts::RegistrationCtxData;
use crate::services::auth_service;
use stepwise::{Control, Flow, Shared};
use tracing::{event, info, warn, Level};

pub fn registration_flow() -> Flow<RegistrationCtxData, AppError> {
  let mut flow = Flow::new("registration")
    .step("validate_registration")
    .step("check_existing_user")
    .step("create_user");

  flow.on("validate_registration", validate_registration);
  flow.on("check_existing_user", check_existing_user);
  flow.on("create_user", create_user);
  flow
}

fn clean(v: &Option<String>) -> Option<String> {
  v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

async fn validate_registration(ctx: Shared<RegistrationCtxData>) -> Result<Control> {
  let mut guard = ctx.write();
  guard.name = guard.name.trim().to_string();
  guard.email = guard.email.trim().to_ascii_lowercase();
  guard.username = clean(&guard.username);
  guard.country = clean(&guard.country);
  guard.postcode = clean(&guard.postcode);
  guard.address = clean(&guard.address);
  guard.phone = clean(&guard.phone);

  event!(Level::DEBUG, email = %guard.email, "Validating registration input.");
  if guard.name.is_empty() {
    return Err(AppError::Validation("Name is required.".to_string()));
  }
  intake::validate_email(&guard.email)?;
  if let Some(postcode) = guard.postcode.as_deref() {
    intake::validate_postcode(postcode)?;
  }
  if guard.password.len() < auth_service::MIN_PASSWORD_LEN {
    warn!("Password too short for registration ({} chars).", guard.password.len());
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters long.",
      auth_service::MIN_PASSWORD_LEN
    )));
  }
  Ok(Control::Proceed)
}

async fn check_existing_user(ctx: Shared<RegistrationCtxData>) -> Result<Control> {
  let (store, email) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.email.clone())
  };

  if store.find_user_by_email(&email).await?.is_some() {
    warn!(%email, "Registration for an existing email.");
    return Err(AppError::Conflict("An account with this email already exists.".to_string()));
  }
  Ok(Control::Proceed)
}

async fn create_user(ctx: Shared<RegistrationCtxData>) -> Result<Control> {
  let (store, new_user, password) = {
    let guard = ctx.read();
    (
      guard.app_state.store.clone(),
      NewUser {
        email: guard.email.clone(),
        name: guard.name.clone(),
        username: guard.username.clone(),
        password_hash: None,
        country: guard.country.clone(),
        postcode: guard.postcode.clone(),
        address: guard.address.clone(),
        phone: guard.phone.clone(),
      },
      guard.password.clone(),
    )
  };

  let new_user = NewUser {
    password_hash: Some(auth_service::hash_password(&password)?),
    ..new_user
  };
  // The unique index still guards the race between the check and this insert.
  let user = store.register_user(new_user).await?;
  info!(user_id = %user.id, email = %user.email, "User registered.");
  ctx.write().created_user = Some(user);
  Ok(Control::Proceed)
}
