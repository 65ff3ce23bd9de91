// apps/basket_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Postgres connection string. Unset runs the server against the in-memory store.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  /// Fills the in-memory catalog with demo products. Ignored with a database.
  pub seed_catalog: bool,
  pub log_json: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      database_max_connections: 5,
      seed_catalog: false,
      log_json: false,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let defaults = Self::default();

    let config = Self {
      server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: parse_var("SERVER_PORT", defaults.server_port)?,
      database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
      database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
      seed_catalog: parse_var("SEED_CATALOG", defaults.seed_catalog)?,
      log_json: parse_var("LOG_JSON", defaults.log_json)?,
    };

    if config.database_max_connections == 0 {
      return Err(AppError::Config("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    Ok(config)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
    Err(_) => Ok(default),
  }
}
