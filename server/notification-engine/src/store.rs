//! Ordered, capped notification list (newest first).

use crate::types::Notification;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationList {
  capacity: usize,
  items: Vec<Notification>,
}

impl NotificationList {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      items: Vec::new(),
    }
  }

  /// Build from stored items (assumed newest first), truncated to capacity.
  pub fn from_items(capacity: usize, items: Vec<Notification>) -> Self {
    let mut list = Self {
      capacity: capacity.max(1),
      items,
    };
    list.items.truncate(list.capacity);
    list
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn as_slice(&self) -> &[Notification] {
    &self.items
  }

  pub fn iter(&self) -> impl Iterator<Item = &Notification> {
    self.items.iter()
  }

  pub fn into_items(self) -> Vec<Notification> {
    self.items
  }

  pub fn get(&self, id: &str) -> Option<&Notification> {
    self.items.iter().find(|n| n.id == id)
  }

  pub fn get_mut(&mut self, id: &str) -> Option<&mut Notification> {
    self.items.iter_mut().find(|n| n.id == id)
  }

  /// Newest entry satisfying `pred`.
  pub fn find_mut<F>(&mut self, pred: F) -> Option<&mut Notification>
  where
    F: Fn(&Notification) -> bool,
  {
    self.items.iter_mut().find(|n| pred(n))
  }

  /// Apply `f` to every entry satisfying `pred`; returns how many were touched.
  pub fn update_where<P, F>(&mut self, pred: P, mut f: F) -> usize
  where
    P: Fn(&Notification) -> bool,
    F: FnMut(&mut Notification),
  {
    let mut touched = 0;
    for n in self.items.iter_mut().filter(|n| pred(n)) {
      f(n);
      touched += 1;
    }
    touched
  }

  /// Insert at the front and evict from the back past capacity. Returns evicted entries.
  pub fn prepend(&mut self, notification: Notification) -> Vec<Notification> {
    self.items.insert(0, notification);
    if self.items.len() > self.capacity {
      self.items.split_off(self.capacity)
    } else {
      Vec::new()
    }
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{ActionState, Severity};
  use chrono::{TimeZone, Utc};

  fn notif(id: &str) -> Notification {
    Notification {
      id: id.into(),
      alert_type: "System".into(),
      message: "m".into(),
      suggestion: None,
      suggestion_text: None,
      timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
      zone_id: "z1".into(),
      severity: Severity::Info,
      action_state: ActionState::Dismissed,
    }
  }

  #[test]
  fn prepend_keeps_newest_first() {
    let mut list = NotificationList::new(50);
    list.prepend(notif("a"));
    list.prepend(notif("b"));
    let ids: Vec<_> = list.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
  }

  #[test]
  fn prepend_evicts_oldest_past_capacity() {
    let mut list = NotificationList::new(3);
    for id in ["a", "b", "c"] {
      assert!(list.prepend(notif(id)).is_empty());
    }
    let evicted = list.prepend(notif("d"));
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].id, "a");
    assert_eq!(list.len(), 3);
    assert_eq!(list.as_slice()[0].id, "d");
  }

  #[test]
  fn from_items_truncates() {
    let items = (0..10).map(|i| notif(&i.to_string())).collect();
    let list = NotificationList::from_items(4, items);
    assert_eq!(list.len(), 4);
    assert_eq!(list.as_slice()[0].id, "0");
  }

  #[test]
  fn update_where_counts_matches() {
    let mut list = NotificationList::new(10);
    list.prepend(notif("a"));
    list.prepend(notif("b"));
    let n = list.update_where(|n| n.id == "a", |n| n.message = "x".into());
    assert_eq!(n, 1);
    assert_eq!(list.get("a").unwrap().message, "x");
    assert_eq!(list.get("b").unwrap().message, "m");
  }
}
