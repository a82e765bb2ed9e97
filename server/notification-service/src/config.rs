//! Service configuration, read from the environment with sane defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use notification_engine::Config;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
  pub engine: Config,
  /// Directory backing the key-value store.
  pub storage_dir: PathBuf,
  /// Authenticated command endpoint (POST `{zoneId, command}`).
  pub command_url: String,
  /// Bearer token for the command endpoint.
  pub api_token: Option<String>,
  pub dispatch_timeout: Duration,
  pub port: u16,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      engine: Config::default(),
      storage_dir: PathBuf::from("./data"),
      command_url: "http://localhost:8000/commands/send".into(),
      api_token: None,
      dispatch_timeout: Duration::from_secs(10),
      port: 5005,
    }
  }
}

impl ServiceConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Build from an arbitrary variable lookup; unset or blank variables keep their defaults.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut cfg = Self::default();

    if let Some(ns) = get("ECOHUB_NAMESPACE") {
      cfg.engine.namespace = ns;
    }
    if let Some(cap) = get("ECOHUB_MAX_NOTIFICATIONS") {
      cfg.engine.capacity = parse("ECOHUB_MAX_NOTIFICATIONS", &cap)?;
      if cfg.engine.capacity == 0 {
        return Err(ConfigError::invalid("ECOHUB_MAX_NOTIFICATIONS", "must be at least 1"));
      }
    }
    if let Some(dir) = get("ECOHUB_STORAGE_DIR") {
      cfg.storage_dir = PathBuf::from(dir);
    }
    if let Some(url) = get("ECOHUB_COMMAND_URL") {
      cfg.command_url = url;
    }
    cfg.api_token = get("ECOHUB_API_TOKEN");
    if let Some(secs) = get("ECOHUB_DISPATCH_TIMEOUT_SECS") {
      cfg.dispatch_timeout = Duration::from_secs(parse("ECOHUB_DISPATCH_TIMEOUT_SECS", &secs)?);
    }
    if let Some(port) = get("PORT") {
      cfg.port = parse("PORT", &port)?;
    }
    Ok(cfg)
  }
}

fn parse<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .parse()
    .map_err(|e: T::Err| ConfigError::invalid(name, format!("{:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |k| map.get(k).cloned()
  }

  #[test]
  fn defaults_when_unset() {
    let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.engine.namespace, "ecohub");
    assert_eq!(cfg.engine.capacity, 50);
    assert_eq!(cfg.port, 5005);
    assert!(cfg.api_token.is_none());
  }

  #[test]
  fn overrides_are_applied() {
    let cfg = ServiceConfig::from_lookup(lookup(&[
      ("ECOHUB_NAMESPACE", "farm"),
      ("ECOHUB_MAX_NOTIFICATIONS", "20"),
      ("ECOHUB_API_TOKEN", "secret"),
      ("ECOHUB_DISPATCH_TIMEOUT_SECS", "3"),
      ("PORT", "6000"),
    ]))
    .unwrap();
    assert_eq!(cfg.engine.namespace, "farm");
    assert_eq!(cfg.engine.capacity, 20);
    assert_eq!(cfg.api_token.as_deref(), Some("secret"));
    assert_eq!(cfg.dispatch_timeout, Duration::from_secs(3));
    assert_eq!(cfg.port, 6000);
  }

  #[test]
  fn bad_numbers_are_rejected() {
    let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
    assert!(err.to_string().contains("PORT"));
    let err = ServiceConfig::from_lookup(lookup(&[("ECOHUB_MAX_NOTIFICATIONS", "0")])).unwrap_err();
    assert!(err.to_string().contains("at least 1"));
  }
}
