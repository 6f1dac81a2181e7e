// keyshop/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{payment_handlers, user_handlers};
use actix_web::{web, HttpResponse};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounts the API under `/api`. Malformed JSON bodies and path ids are
/// reported in the same `{success, error}` shape as every other error.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid request body: {}", err)).into()),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid path parameter: {}", err)).into()),
    )
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/payments")
            .route("/buy", web::post().to(payment_handlers::buy_handler))
            .route("/pay", web::post().to(payment_handlers::pay_handler))
            .route("/{payment_id}", web::get().to(payment_handlers::get_payment_handler)),
        )
        .service(
          web::scope("/users")
            .route("/register", web::post().to(user_handlers::register_handler))
            .route("/{user_id}", web::get().to(user_handlers::get_user_handler))
            .route("/{user_id}/payments", web::get().to(user_handlers::user_payments_handler)),
        ),
    );
}
