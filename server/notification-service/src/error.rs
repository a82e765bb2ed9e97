//! Error types for the notification service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("service loop has shut down")]
  Closed,
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("transport: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("command endpoint returned {0}")]
  Status(u16),
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{name}: {reason}")]
  Invalid { name: String, reason: String },
}

impl ConfigError {
  pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
    Self::Invalid {
      name: name.to_string(),
      reason: reason.into(),
    }
  }
}
