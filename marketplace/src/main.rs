// marketplace/src/main.rs

use adaze_marketplace::config::{AppConfig, LogFormat};
use adaze_marketplace::services::seed::seed_demo_data;
use adaze_marketplace::store::{MarketStore, MemoryStore, PgStore};
use adaze_marketplace::{build_state, web::configure_app_routes};

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // LOG_FORMAT is read ahead of the full config so config loading itself is logged.
  dotenvy::dotenv().ok();
  let log_format = std::env::var("LOG_FORMAT")
    .ok()
    .and_then(|raw| raw.parse().ok())
    .unwrap_or_default();
  init_tracing(log_format);

  tracing::info!("Starting ADAZE marketplace server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store: Arc<dyn MarketStore> = match &app_config.database_url {
    Some(url) => {
      let pg = PgStore::connect(url).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to the database.");
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
      })?;
      pg.migrate().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to apply the database schema.");
        std::io::Error::other(e.to_string())
      })?;
      tracing::info!("Connected to Postgres and applied schema.");
      Arc::new(pg)
    }
    None => {
      tracing::warn!("DATABASE_URL not set, using the in-memory store. Data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  if app_config.seed_demo_data {
    if let Err(e) = seed_demo_data(store.as_ref()).await {
      tracing::error!(error = %e, "Failed to seed demo data.");
    }
  }

  let server_address = app_config.bind_address();
  let app_state = build_state(store, app_config);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
