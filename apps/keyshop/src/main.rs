// keyshop/src/main.rs

use keyshop::store::{CheckoutStore, MemoryStore, PgStore};
use keyshop::{web, AppConfig, AppState};

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting keyshop server...");

  let app_config = AppConfig::from_env().map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
  })?;

  let store: Arc<dyn CheckoutStore> = if app_config.database_url == "memory" {
    tracing::warn!("DATABASE_URL=memory: records are kept in process and lost on exit.");
    Arc::new(MemoryStore::new())
  } else {
    let pool = PgPoolOptions::new()
      .max_connections(10)
      .connect(&app_config.database_url)
      .await
      .map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to the database.");
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
      })?;
    tracing::info!("Connected to the database.");

    let pg = PgStore::new(pool);
    if app_config.run_migrations {
      pg.migrate().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to apply migrations.");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
      })?;
    }
    Arc::new(pg)
  };

  let server_address = app_config.bind_address();
  let app_state = AppState::from_config(app_config, store).map_err(|e| {
    tracing::error!(error = %e, "Failed to build application state.");
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
  })?;

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
