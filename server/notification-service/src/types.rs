//! Request/response types for the HTTP surface.

use notification_engine::{Decision, Notification};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
  pub decision: Decision,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualActionPayload {
  pub zone_id: String,
  pub command: String,
  pub action_text: String,
}

/// Body returned for decisions and manual actions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notification: Option<Notification>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ignored: Option<String>,
}
