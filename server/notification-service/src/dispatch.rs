//! Command dispatch: hands an accepted suggestion to the device command endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::DispatchError;

/// Sends a command to a zone. Any failure means the command was not accepted.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
  async fn dispatch(&self, zone_id: &str, command: &str) -> Result<(), DispatchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest<'a> {
  zone_id: &'a str,
  command: &'a str,
}

/// POSTs `{zoneId, command}` as JSON; any 2xx is success.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
  client: reqwest::Client,
  url: String,
  token: Option<String>,
}

impl HttpDispatcher {
  pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, DispatchError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      url: url.into(),
      token,
    })
  }
}

#[async_trait]
impl CommandDispatcher for HttpDispatcher {
  async fn dispatch(&self, zone_id: &str, command: &str) -> Result<(), DispatchError> {
    let mut req = self
      .client
      .post(&self.url)
      .json(&CommandRequest { zone_id, command });
    if let Some(token) = &self.token {
      req = req.bearer_auth(token);
    }

    let resp = req.send().await?;
    let status = resp.status();
    debug!(%zone_id, %command, %status, "command endpoint responded");
    if status.is_success() {
      Ok(())
    } else {
      Err(DispatchError::Status(status.as_u16()))
    }
  }
}
