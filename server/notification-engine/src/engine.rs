//! Core engine: owns the notification list, applies actions, notifies observers.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::correlation::{self, Outcome};
use crate::error::EngineError;
use crate::normalize;
use crate::store::NotificationList;
use crate::types::*;

/// Hook invoked after every reduction that changed the list.
pub trait StoreObserver: Send {
  fn on_change(&mut self, notifications: &[Notification]);

  /// The list was wiped by "clear all".
  fn on_clear(&mut self) {
    self.on_change(&[]);
  }
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
  pub outcome: Outcome,
  pub effect: Option<Effect>,
}

/// The notification correlation engine. Holds in-memory state across events.
pub struct Engine {
  config: Config,
  list: NotificationList,
  observers: Vec<Box<dyn StoreObserver>>,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    let list = NotificationList::new(config.capacity);
    Self {
      config,
      list,
      observers: Vec::new(),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  /// Start from a previously loaded list (already normalized by the persistence layer).
  pub fn restore(config: Config, items: Vec<Notification>) -> Self {
    let list = NotificationList::from_items(config.capacity, items);
    Self {
      config,
      list,
      observers: Vec::new(),
    }
  }

  pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
    self.observers.push(observer);
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn notifications(&self) -> &[Notification] {
    self.list.as_slice()
  }

  pub fn get(&self, id: &str) -> Option<&Notification> {
    self.list.get(id)
  }

  /// Normalize a raw bus message and ingest it.
  ///
  /// Malformed messages return an error and leave the list untouched.
  pub fn ingest_message(&mut self, topic: &str, payload: &[u8]) -> Result<Applied, EngineError> {
    let event = normalize::normalize(&self.config.namespace, topic, payload)?;
    Ok(self.apply(Action::Ingest(event)))
  }

  pub fn handle_decision(&mut self, notification_id: &str, decision: Decision) -> Applied {
    self.apply(Action::Decide {
      notification_id: notification_id.to_string(),
      decision,
    })
  }

  pub fn track_manual_action(&mut self, zone_id: &str, command: &str, action_text: &str) -> Applied {
    self.apply(Action::ManualAction {
      zone_id: zone_id.to_string(),
      command: command.to_string(),
      action_text: action_text.to_string(),
    })
  }

  pub fn clear_all(&mut self) -> Applied {
    self.apply(Action::ClearAll)
  }

  /// Apply an action with a fresh id and the current time.
  pub fn apply(&mut self, action: Action) -> Applied {
    self.apply_at(action, Stamp::now())
  }

  /// Apply an action against the latest list, then notify observers if it changed.
  pub fn apply_at(&mut self, action: Action, stamp: Stamp) -> Applied {
    let reduction = correlation::reduce(&self.list, &action, &stamp);
    let changed = reduction.list != self.list;
    self.list = reduction.list;

    log_outcome(&action, &reduction.outcome);

    // Clearing always reaches observers so a stale persisted copy is removed too.
    if matches!(reduction.outcome, Outcome::Cleared) {
      for obs in self.observers.iter_mut() {
        obs.on_clear();
      }
    } else if changed {
      for obs in self.observers.iter_mut() {
        obs.on_change(self.list.as_slice());
      }
    }

    Applied {
      outcome: reduction.outcome,
      effect: reduction.effect,
    }
  }
}

fn log_outcome(action: &Action, outcome: &Outcome) {
  match outcome {
    Outcome::Created {
      id,
      superseded,
      evicted,
    } => info!(notification_id = %id, superseded, evicted, "notification created"),
    Outcome::Escalated { id } => info!(notification_id = %id, "fix already underway; marked in progress"),
    Outcome::Completed { id } => info!(notification_id = %id, "command completed"),
    Outcome::Activated { id } => info!(notification_id = %id, "suggestion accepted"),
    Outcome::Dismissed { id } => info!(notification_id = %id, "suggestion dismissed"),
    Outcome::Confirmed { id } => debug!(notification_id = %id, "dispatch confirmed"),
    Outcome::RolledBack { id } => {
      let reason = match action {
        Action::DispatchFailed { reason, .. } => reason.as_str(),
        _ => "",
      };
      warn!(notification_id = %id, %reason, "dispatch failed; suggestion rolled back to pending")
    }
    Outcome::ManualTracked { id } => info!(notification_id = %id, "manual action folded into notification"),
    Outcome::Cleared => info!("notifications cleared"),
    Outcome::Ignored { reason } => debug!(?action, %reason, "action ignored"),
  }
}
