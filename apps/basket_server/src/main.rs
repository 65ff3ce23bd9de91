// apps/basket_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use basket::{InMemoryGateway, RemoteCartGateway};
use basket_server::config::AppConfig;
use basket_server::db::PgCartGateway;
use basket_server::errors::AppError;
use basket_server::seed::demo_catalog;
use basket_server::state::AppState;
use basket_server::web::configure_app_routes;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  if json {
    tracing_subscriber::fmt()
      .json()
      .with_env_filter(filter)
      .with_span_events(FmtSpan::CLOSE)
      .init();
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_span_events(FmtSpan::CLOSE)
      .init();
  }
}

async fn build_gateway(config: &AppConfig) -> Result<Arc<dyn RemoteCartGateway>, AppError> {
  let Some(database_url) = config.database_url.as_deref() else {
    let gateway = InMemoryGateway::new();
    if config.seed_catalog {
      for product in demo_catalog() {
        tracing::info!(product_id = %product.id, name = %product.name, price_cents = product.price_cents, "Seeded product.");
        gateway.add_product(product);
      }
    }
    tracing::warn!("DATABASE_URL not set; carts and orders live in memory only.");
    return Ok(Arc::new(gateway));
  };

  let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(database_url)
    .await?;
  tracing::info!("Successfully connected to the database.");
  let gateway = PgCartGateway::new(pool);
  gateway.apply_schema().await?;
  Ok(Arc::new(gateway))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let config = match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      init_tracing(false);
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(config.log_json);
  tracing::info!("Starting basket server...");

  let gateway = build_gateway(&config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise the cart store.");
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
  })?;

  let server_address = config.bind_address();
  let app_state = AppState::new(config, gateway);
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
