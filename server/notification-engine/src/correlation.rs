//! Correlate alerts, completions, decisions and manual actions against the notification list.
//!
//! Every entry point is a pure reduction: it reads the *current* list, returns the next one,
//! and describes any dispatch the caller must perform. Entries are always re-located by
//! id or by (zone, suggestion), never by position, so a late dispatch outcome lands on the
//! right entry even after other events reshuffled the list.

use crate::severity;
use crate::store::NotificationList;
use crate::types::*;

pub const IN_PROGRESS_PREFIX: &str = "In progress: ";
pub const COMPLETED_PREFIX: &str = "Completed: ";
pub const FAILED_PREFIX: &str = "Failed: ";
pub const MANUAL_CONTROL_TYPE: &str = "Manual Control";

/// What a reduction did. Drives logging and lets callers answer requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// New entry prepended. `superseded` older pending entries were dismissed.
  Created { id: String, superseded: usize, evicted: usize },
  /// Same problem fired again while a fix was underway.
  Escalated { id: String },
  Completed { id: String },
  Activated { id: String },
  Dismissed { id: String },
  /// Dispatch succeeded; the entry keeps its state.
  Confirmed { id: String },
  RolledBack { id: String },
  /// Manual action folded into an existing entry.
  ManualTracked { id: String },
  Cleared,
  Ignored { reason: &'static str },
}

#[derive(Debug, Clone)]
pub struct Reduction {
  pub list: NotificationList,
  pub outcome: Outcome,
  pub effect: Option<Effect>,
}

impl Reduction {
  fn new(list: NotificationList, outcome: Outcome) -> Self {
    Self {
      list,
      outcome,
      effect: None,
    }
  }
}

/// Compute the next list for one action. `prior` is left untouched.
pub fn reduce(prior: &NotificationList, action: &Action, stamp: &Stamp) -> Reduction {
  let mut list = prior.clone();
  match action {
    Action::Ingest(ev) => {
      let outcome = ingest(&mut list, ev, stamp);
      Reduction::new(list, outcome)
    }
    Action::Decide {
      notification_id,
      decision,
    } => {
      let (outcome, effect) = decide(&mut list, notification_id, *decision);
      Reduction {
        list,
        outcome,
        effect,
      }
    }
    Action::DispatchSucceeded { notification_id } => {
      let outcome = match list.get(notification_id) {
        Some(_) => Outcome::Confirmed {
          id: notification_id.clone(),
        },
        None => Outcome::Ignored {
          reason: "dispatched notification no longer in list",
        },
      };
      Reduction::new(list, outcome)
    }
    Action::DispatchFailed {
      notification_id, ..
    } => {
      let outcome = roll_back(&mut list, notification_id);
      Reduction::new(list, outcome)
    }
    Action::ManualAction {
      zone_id,
      command,
      action_text,
    } => {
      let outcome = track_manual_action(&mut list, zone_id, command, action_text, stamp);
      Reduction::new(list, outcome)
    }
    Action::ClearAll => {
      list.clear();
      Reduction::new(list, Outcome::Cleared)
    }
  }
}

/// Route a normalized bus event to the completion or alert path.
pub fn ingest(list: &mut NotificationList, ev: &ZoneEvent, stamp: &Stamp) -> Outcome {
  match &ev.event {
    Event::Completion { command } => complete(list, &ev.zone_id, command, stamp),
    Event::Alert(alert) => raise(list, &ev.zone_id, alert, stamp),
  }
}

/// Completion signal: close the underway entry for (zone, command), if any.
///
/// Entries already evicted by the cap cannot be found; the signal is dropped.
pub fn complete(list: &mut NotificationList, zone_id: &str, command: &str, stamp: &Stamp) -> Outcome {
  let Some(n) = list.find_mut(|n| n.matches(zone_id, command) && n.action_state.is_underway()) else {
    return Outcome::Ignored {
      reason: "no underway notification for completed command",
    };
  };
  let original = n.message.strip_prefix(IN_PROGRESS_PREFIX).unwrap_or(&n.message);
  n.message = format!("{}{}", COMPLETED_PREFIX, original);
  n.action_state = ActionState::Dismissed;
  n.timestamp = stamp.at;
  Outcome::Completed { id: n.id.clone() }
}

/// Alert path: escalate an underway duplicate, or supersede pending ones and prepend.
pub fn raise(list: &mut NotificationList, zone_id: &str, alert: &AlertEvent, stamp: &Stamp) -> Outcome {
  let severity = severity::classify(&alert.alert_type);

  if let Some(command) = alert.suggestion.as_deref() {
    if let Some(n) = list.find_mut(|n| n.matches(zone_id, command) && n.action_state.is_underway()) {
      n.action_state = ActionState::InProgress;
      n.message = format!("{}{}", IN_PROGRESS_PREFIX, alert.message);
      n.timestamp = stamp.at;
      return Outcome::Escalated { id: n.id.clone() };
    }
  }

  let superseded = match alert.suggestion.as_deref() {
    Some(command) => list.update_where(
      |n| n.matches(zone_id, command) && n.action_state == ActionState::Pending,
      |n| n.action_state = ActionState::Dismissed,
    ),
    None => 0,
  };

  let action_state = if alert.suggestion.is_some() {
    ActionState::Pending
  } else {
    ActionState::Dismissed
  };

  let evicted = list.prepend(Notification {
    id: stamp.id.clone(),
    alert_type: alert.alert_type.clone(),
    message: alert.message.clone(),
    suggestion: alert.suggestion.clone(),
    suggestion_text: alert.suggestion_text.clone(),
    timestamp: stamp.at,
    zone_id: zone_id.to_string(),
    severity,
    action_state,
  });

  Outcome::Created {
    id: stamp.id.clone(),
    superseded,
    evicted: evicted.len(),
  }
}

/// Explicit user decision. `yes` moves a pending suggestion to `activated` and asks for a dispatch.
pub fn decide(list: &mut NotificationList, id: &str, decision: Decision) -> (Outcome, Option<Effect>) {
  let Some(n) = list.get_mut(id) else {
    return (
      Outcome::Ignored {
        reason: "unknown notification id",
      },
      None,
    );
  };

  match decision {
    Decision::No => {
      if n.action_state == ActionState::Dismissed {
        return (
          Outcome::Ignored {
            reason: "notification already dismissed",
          },
          None,
        );
      }
      n.action_state = ActionState::Dismissed;
      (Outcome::Dismissed { id: n.id.clone() }, None)
    }
    Decision::Yes => {
      let Some(command) = n.suggestion.clone() else {
        return (
          Outcome::Ignored {
            reason: "notification has no suggestion",
          },
          None,
        );
      };
      if n.action_state != ActionState::Pending {
        return (
          Outcome::Ignored {
            reason: "suggestion is not pending",
          },
          None,
        );
      }
      n.action_state = ActionState::Activated;
      let effect = Effect::Dispatch {
        notification_id: n.id.clone(),
        zone_id: n.zone_id.clone(),
        command,
      };
      (Outcome::Activated { id: n.id.clone() }, Some(effect))
    }
  }
}

/// Dispatch failed: put the suggestion back in front of the user.
///
/// Only entries still underway are rolled back; a completion or dismissal that landed
/// while the dispatch was in flight wins.
pub fn roll_back(list: &mut NotificationList, id: &str) -> Outcome {
  let Some(n) = list.get_mut(id) else {
    return Outcome::Ignored {
      reason: "dispatched notification no longer in list",
    };
  };
  if !n.action_state.is_underway() {
    return Outcome::Ignored {
      reason: "notification no longer underway",
    };
  }
  n.action_state = ActionState::Pending;
  if !n.message.starts_with(FAILED_PREFIX) {
    n.message = format!("{}{}", FAILED_PREFIX, n.message);
  }
  Outcome::RolledBack { id: n.id.clone() }
}

/// Fold a user-issued device command into the list.
///
/// A pending suggestion for the same command is taken over instead of adding a duplicate
/// next to it.
pub fn track_manual_action(
  list: &mut NotificationList,
  zone_id: &str,
  command: &str,
  action_text: &str,
  stamp: &Stamp,
) -> Outcome {
  let existing = list
    .iter()
    .filter(|n| n.matches(zone_id, command))
    .find(|n| n.action_state == ActionState::Pending)
    .or_else(|| {
      list
        .iter()
        .find(|n| n.matches(zone_id, command) && n.action_state.is_underway())
    })
    .map(|n| n.id.clone());

  if let Some(id) = existing {
    if let Some(n) = list.get_mut(&id) {
      n.alert_type = MANUAL_CONTROL_TYPE.to_string();
      n.severity = Severity::Info;
      n.action_state = ActionState::InProgress;
      n.message = action_text.to_string();
      n.timestamp = stamp.at;
      return Outcome::ManualTracked { id };
    }
  }

  let evicted = list.prepend(Notification {
    id: stamp.id.clone(),
    alert_type: MANUAL_CONTROL_TYPE.to_string(),
    message: action_text.to_string(),
    suggestion: Some(command.to_string()),
    suggestion_text: None,
    timestamp: stamp.at,
    zone_id: zone_id.to_string(),
    severity: Severity::Info,
    action_state: ActionState::InProgress,
  });

  Outcome::Created {
    id: stamp.id.clone(),
    superseded: 0,
    evicted: evicted.len(),
  }
}
