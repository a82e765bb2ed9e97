//! Engine configuration with sane defaults.

/// Tunables for the notification engine.
#[derive(Debug, Clone)]
pub struct Config {
  /// First topic segment of `<namespace>/{zoneId}/notifications`.
  pub namespace: String,
  /// Max notifications kept, newest first.
  pub capacity: usize,
  /// Key the list is persisted under.
  pub storage_key: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      namespace: "ecohub".into(),
      capacity: 50,
      storage_key: "ecohub_notifications".into(),
    }
  }
}
