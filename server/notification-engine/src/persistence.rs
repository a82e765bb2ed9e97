//! Persist the notification list through a synchronous key-value surface.
//!
//! The whole list is stored as one JSON array under one key. On load, any entry still
//! `pending` is dismissed: the condition behind a suggestion may have changed while the
//! process was down, so it is never offered again automatically.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

use crate::engine::StoreObserver;
use crate::error::StoreError;
use crate::types::{ActionState, Notification};

/// Local-storage style key-value surface.
pub trait KeyValueStore: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
  fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.entries().get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.entries().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    self.entries().remove(key);
    Ok(())
  }
}

/// One file per key under a directory. Writes go through a temp file + rename.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
    let valid = !key.is_empty()
      && key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
      && !key.starts_with('.');
    if !valid {
      return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(self.dir.join(format!("{}.json", key)))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let path = self.path_for(key)?;
    match fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    let path = self.path_for(key)?;
    let tmp = path.with_extension("json.tmp");
    {
      let mut f = fs::File::create(&tmp)?;
      f.write_all(value.as_bytes())?;
      f.sync_all()?;
    }
    fs::rename(&tmp, &path)?;
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

/// Serialize the list in the persisted record format.
pub fn encode(notifications: &[Notification]) -> Result<String, StoreError> {
  Ok(serde_json::to_string(notifications)?)
}

/// Deserialize a persisted list, dismissing anything still pending.
pub fn decode(raw: &str) -> Result<Vec<Notification>, StoreError> {
  let mut items: Vec<Notification> = serde_json::from_str(raw)?;
  for n in items.iter_mut() {
    if n.action_state == ActionState::Pending {
      n.action_state = ActionState::Dismissed;
    }
  }
  Ok(items)
}

/// Binds a key-value store to the notification key.
pub struct PersistenceAdapter<S> {
  store: S,
  key: String,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
  pub fn new(store: S, key: impl Into<String>) -> Self {
    Self {
      store,
      key: key.into(),
    }
  }

  /// Load the persisted list. Missing or unreadable data yields an empty list.
  pub fn load(&self) -> Vec<Notification> {
    let raw = match self.store.get(&self.key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return Vec::new(),
      Err(e) => {
        error!(key = %self.key, error = %e, "failed to read persisted notifications");
        return Vec::new();
      }
    };
    match decode(&raw) {
      Ok(items) => {
        debug!(key = %self.key, count = items.len(), "loaded persisted notifications");
        items
      }
      Err(e) => {
        warn!(key = %self.key, error = %e, "failed to parse persisted notifications");
        Vec::new()
      }
    }
  }

  pub fn save(&mut self, notifications: &[Notification]) -> Result<(), StoreError> {
    let raw = encode(notifications)?;
    self.store.set(&self.key, &raw)
  }

  pub fn clear(&mut self) -> Result<(), StoreError> {
    self.store.remove(&self.key)
  }

  pub fn store(&self) -> &S {
    &self.store
  }
}

impl<S: KeyValueStore> StoreObserver for PersistenceAdapter<S> {
  fn on_change(&mut self, notifications: &[Notification]) {
    if let Err(e) = self.save(notifications) {
      error!(key = %self.key, error = %e, "failed to persist notifications");
    }
  }

  fn on_clear(&mut self) {
    if let Err(e) = self.clear() {
      error!(key = %self.key, error = %e, "failed to clear persisted notifications");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Severity;
  use chrono::{TimeZone, Utc};

  fn notif(id: &str, state: ActionState) -> Notification {
    Notification {
      id: id.into(),
      alert_type: "Need water".into(),
      message: "dry".into(),
      suggestion: Some("PUMP_ON".into()),
      suggestion_text: Some("Turn the pump on".into()),
      timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
      zone_id: "z1".into(),
      severity: Severity::Warning,
      action_state: state,
    }
  }

  #[test]
  fn record_format_uses_camel_case_and_iso_timestamps() {
    let raw = encode(&[notif("a", ActionState::InProgress)]).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rec = &v[0];
    assert_eq!(rec["type"], "Need water");
    assert_eq!(rec["zoneId"], "z1");
    assert_eq!(rec["suggestionText"], "Turn the pump on");
    assert_eq!(rec["actionState"], "in_progress");
    assert_eq!(rec["severity"], "warning");
    assert_eq!(rec["timestamp"], "2025-01-15T10:30:00Z");
  }

  #[test]
  fn absent_suggestion_is_omitted() {
    let mut n = notif("a", ActionState::Dismissed);
    n.suggestion = None;
    n.suggestion_text = None;
    let raw = encode(&[n]).unwrap();
    assert!(!raw.contains("suggestion"));
  }

  #[test]
  fn decode_dismisses_pending() {
    let raw = encode(&[
      notif("a", ActionState::Pending),
      notif("b", ActionState::Activated),
      notif("c", ActionState::InProgress),
    ])
    .unwrap();
    let items = decode(&raw).unwrap();
    let states: Vec<_> = items.iter().map(|n| n.action_state).collect();
    assert_eq!(
      states,
      vec![ActionState::Dismissed, ActionState::Activated, ActionState::InProgress]
    );
  }

  #[test]
  fn adapter_round_trip_through_memory_store() {
    let store = MemoryStore::new();
    let mut adapter = PersistenceAdapter::new(store.clone(), "k");
    adapter.save(&[notif("a", ActionState::Activated)]).unwrap();
    assert!(store.get("k").unwrap().is_some());

    let reloaded = PersistenceAdapter::new(store.clone(), "k").load();
    assert_eq!(reloaded, vec![notif("a", ActionState::Activated)]);

    adapter.clear().unwrap();
    assert!(store.get("k").unwrap().is_none());
  }

  #[test]
  fn corrupt_data_loads_empty() {
    let mut store = MemoryStore::new();
    store.set("k", "{not json").unwrap();
    assert!(PersistenceAdapter::new(store, "k").load().is_empty());
  }

  #[test]
  fn file_store_get_set_remove() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    assert!(store.get("ecohub_notifications").unwrap().is_none());
    store.set("ecohub_notifications", "[]").unwrap();
    assert_eq!(store.get("ecohub_notifications").unwrap().as_deref(), Some("[]"));
    store.remove("ecohub_notifications").unwrap();
    assert!(store.get("ecohub_notifications").unwrap().is_none());
    // Removing a missing key is fine.
    store.remove("ecohub_notifications").unwrap();
  }

  #[test]
  fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(matches!(store.get("../etc/passwd"), Err(StoreError::InvalidKey(_))));
    assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
  }
}
