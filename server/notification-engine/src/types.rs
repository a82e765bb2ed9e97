//! Core types for the notification engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the bus delivers)
// ---------------------------------------------------------------------------

/// One bus payload from `<namespace>/{zoneId}/notifications`. Unknown fields are silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundPayload {
  #[serde(default, rename = "type")]
  pub alert_type: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub suggestion: Option<String>,
  #[serde(default)]
  pub suggestion_text: Option<String>,
  /// Absent and `null` both mean an ordinary alert.
  #[serde(default)]
  pub is_completion_signal: Option<bool>,
  #[serde(default)]
  pub completed_command: Option<String>,
}

// ---------------------------------------------------------------------------
// Severity / action state enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Warning,
  Critical,
}

/// Lifecycle stage of a notification's remedial action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
  /// Suggestion offered, waiting on the user.
  Pending,
  /// User accepted; the command was handed to the dispatcher.
  Activated,
  /// The condition fired again (or a manual action started) while a fix is underway.
  InProgress,
  /// Nothing left to act on.
  Dismissed,
}

impl ActionState {
  /// Pending, activated and in-progress entries are actionable.
  pub fn is_actionable(self) -> bool {
    !matches!(self, Self::Dismissed)
  }

  /// A command is underway (dispatched or reported running).
  pub fn is_underway(self) -> bool {
    matches!(self, Self::Activated | Self::InProgress)
  }
}

// ---------------------------------------------------------------------------
// Notification (the stored entity + persisted record format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  #[serde(rename = "type")]
  pub alert_type: String,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggestion_text: Option<String>,
  pub timestamp: DateTime<Utc>,
  pub zone_id: String,
  pub severity: Severity,
  pub action_state: ActionState,
}

impl Notification {
  /// Same zone and same (non-empty) suggestion.
  pub fn matches(&self, zone_id: &str, command: &str) -> bool {
    self.zone_id == zone_id && self.suggestion.as_deref() == Some(command)
  }
}

// ---------------------------------------------------------------------------
// Canonical internal events (after normalization)
// ---------------------------------------------------------------------------

/// A detected condition, optionally carrying a remedial suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
  pub alert_type: String,
  pub message: String,
  pub suggestion: Option<String>,
  pub suggestion_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  Alert(AlertEvent),
  /// A previously suggested command finished executing.
  Completion { command: String },
}

/// A normalized bus message, scoped to its zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEvent {
  pub zone_id: String,
  pub event: Event,
}

// ---------------------------------------------------------------------------
// Actions fed into the reducer, and the effects it asks the caller to run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Yes,
  No,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  Ingest(ZoneEvent),
  Decide {
    notification_id: String,
    decision: Decision,
  },
  DispatchSucceeded {
    notification_id: String,
  },
  DispatchFailed {
    notification_id: String,
    reason: String,
  },
  ManualAction {
    zone_id: String,
    command: String,
    action_text: String,
  },
  ClearAll,
}

/// Side effect requested by a reduction. The reducer itself never performs I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  Dispatch {
    notification_id: String,
    zone_id: String,
    command: String,
  },
}

/// Identity and clock for a single reduction step, supplied by the caller so reducers stay pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
  pub id: String,
  pub at: DateTime<Utc>,
}

impl Stamp {
  pub fn new(id: impl Into<String>, at: DateTime<Utc>) -> Self {
    Self { id: id.into(), at }
  }

  /// Fresh UUID v4 + wall-clock now.
  pub fn now() -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      at: Utc::now(),
    }
  }
}
