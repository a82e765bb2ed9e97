//! Severity from the alert type: first keyword group that matches wins.

use crate::types::Severity;

const CRITICAL_KEYWORDS: &[&str] = &["hot", "cool", "high", "low"];
const WARNING_KEYWORDS: &[&str] = &["water", "light"];

/// Classify an alert type. Case-insensitive substring test; never fails.
pub fn classify(alert_type: &str) -> Severity {
  let t = alert_type.to_lowercase();
  if CRITICAL_KEYWORDS.iter().any(|k| t.contains(k)) {
    Severity::Critical
  } else if WARNING_KEYWORDS.iter().any(|k| t.contains(k)) {
    Severity::Warning
  } else {
    Severity::Info
  }
}
