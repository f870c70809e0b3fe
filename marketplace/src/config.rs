// marketplace/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}', expected pretty or json", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Postgres connection string. Without it the server runs on the in-memory store.
  pub database_url: Option<String>,
  pub session_ttl_hours: i64,
  /// Capacity of the realtime broadcast channel.
  pub event_buffer: usize,
  pub seed_demo_data: bool,
  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      session_ttl_hours: 72,
      event_buffer: 256,
      seed_demo_data: false,
      log_format: LogFormat::Pretty,
    }
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = AppConfig::default();

    let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_var("SERVER_PORT", lookup("SERVER_PORT"), defaults.server_port)?;
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    let session_ttl_hours = parse_var("SESSION_TTL_HOURS", lookup("SESSION_TTL_HOURS"), defaults.session_ttl_hours)?;
    if session_ttl_hours <= 0 {
      return Err(AppError::Config("SESSION_TTL_HOURS must be positive".to_string()));
    }
    let event_buffer = parse_var("EVENT_BUFFER", lookup("EVENT_BUFFER"), defaults.event_buffer)?;
    if event_buffer == 0 {
      return Err(AppError::Config("EVENT_BUFFER must be at least 1".to_string()));
    }
    let seed_demo_data = parse_var("SEED_DEMO_DATA", lookup("SEED_DEMO_DATA"), defaults.seed_demo_data)?;
    let log_format = match lookup("LOG_FORMAT") {
      Some(raw) => raw.parse()?,
      None => defaults.log_format,
    };

    tracing::info!(
      host = %server_host,
      port = server_port,
      persistent = database_url.is_some(),
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      session_ttl_hours,
      event_buffer,
      seed_demo_data,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn defaults_apply_when_unset() {
    let config = AppConfig::from_lookup(lookup_from(&[])).expect("defaults are valid");
    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert!(config.database_url.is_none());
    assert_eq!(config.session_ttl_hours, 72);
    assert_eq!(config.event_buffer, 256);
    assert_eq!(config.log_format, LogFormat::Pretty);
  }

  #[test]
  fn values_are_parsed() {
    let config = AppConfig::from_lookup(lookup_from(&[
      ("SERVER_PORT", "9090"),
      ("DATABASE_URL", "postgres://localhost/adaze"),
      ("SEED_DEMO_DATA", "true"),
      ("LOG_FORMAT", "JSON"),
    ]))
    .expect("valid config");
    assert_eq!(config.server_port, 9090);
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/adaze"));
    assert!(config.seed_demo_data);
    assert_eq!(config.log_format, LogFormat::Json);
  }

  #[test]
  fn invalid_values_are_config_errors() {
    for pairs in [
      vec![("SERVER_PORT", "eighty")],
      vec![("SESSION_TTL_HOURS", "0")],
      vec![("EVENT_BUFFER", "-3")],
      vec![("LOG_FORMAT", "xml")],
    ] {
      let err = AppConfig::from_lookup(lookup_from(&pairs)).expect_err("should be rejected");
      assert!(matches!(err, AppError::Config(_)), "{pairs:?}");
    }
  }
}
