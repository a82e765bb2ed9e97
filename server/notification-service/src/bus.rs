//! Bus feed: `topic payload` lines, as printed by `mosquitto_sub -v`.

use std::io::BufRead;

use tracing::{info, warn};

use crate::service::ServiceHandle;

/// Split a line into topic and payload at the first whitespace.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
  let line = line.trim();
  let (topic, payload) = line.split_once(char::is_whitespace)?;
  let payload = payload.trim_start();
  if topic.is_empty() || payload.is_empty() {
    return None;
  }
  Some((topic, payload))
}

/// Forward every line of `reader` to the service until EOF or shutdown.
///
/// Blocks the calling thread; run it on a dedicated thread, not on the runtime.
pub fn feed_lines<R: BufRead>(reader: R, service: ServiceHandle) -> std::io::Result<()> {
  for line in reader.lines() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let Some((topic, payload)) = parse_line(&line) else {
      warn!(%line, "skipping bus line without topic and payload");
      continue;
    };
    if service.blocking_publish(topic, payload.as_bytes()).is_err() {
      info!("service stopped; closing bus feed");
      break;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_topic_from_payload() {
    let (topic, payload) = parse_line(r#"ecohub/z1/notifications {"message":"a b"}"#).unwrap();
    assert_eq!(topic, "ecohub/z1/notifications");
    assert_eq!(payload, r#"{"message":"a b"}"#);
  }

  #[test]
  fn tolerates_extra_whitespace() {
    let (topic, payload) = parse_line("  ecohub/z1/notifications \t {}  ").unwrap();
    assert_eq!(topic, "ecohub/z1/notifications");
    assert_eq!(payload, "{}");
  }

  #[test]
  fn rejects_lines_without_payload() {
    assert!(parse_line("ecohub/z1/notifications").is_none());
    assert!(parse_line("").is_none());
  }
}
