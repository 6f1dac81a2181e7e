// keyshop/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use stepwise::{Outcome, Shared};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::pipelines::contexts::RegistrationCtxData;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestPayload {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub username: Option<String>,
  pub password: String,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub postcode: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

#[instrument(name = "handler::register", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequestPayload>,
) -> Result<HttpResponse> {
  let req = req_payload.into_inner();
  let ctx = Shared::new(RegistrationCtxData {
    app_state: app_state.get_ref().clone(),
    name: req.name,
    email: req.email,
    username: req.username,
    password: req.password,
    country: req.country,
    postcode: req.postcode,
    address: req.address,
    phone: req.phone,
    created_user: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    Outcome::Completed => {
      let user = ctx
        .read()
        .created_user
        .clone()
        .ok_or_else(|| AppError::Internal("Registration completed without creating a user.".to_string()))?;
      info!(user_id = %user.id, "Registration complete.");
      Ok(HttpResponse::Created().json(user))
    }
    Outcome::Halted => {
      warn!("Registration flow halted unexpectedly.");
      Err(AppError::Internal("Registration was halted by an internal step.".to_string()))
    }
  }
}

#[instrument(name = "handler::get_user", skip(app_state))]
pub async fn get_user_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let user_id = path.into_inner();
  let user = app_state
    .store
    .find_user(user_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found.", user_id)))?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::user_payments", skip(app_state))]
pub async fn user_payments_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let user_id = path.into_inner();
  if app_state.store.find_user(user_id).await?.is_none() {
    return Err(AppError::NotFound(format!("User {} not found.", user_id)));
  }
  let payments = app_state.store.payments_for_user(user_id).await?;
  Ok(HttpResponse::Ok().json(payments))
}
