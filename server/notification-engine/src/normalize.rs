//! Normalize raw bus messages into canonical zone-scoped events.

use crate::error::EngineError;
use crate::types::*;

const NOTIFICATIONS_SEGMENT: &str = "notifications";
const DEFAULT_ALERT_TYPE: &str = "System";

/// Parse a topic + raw payload into a ZoneEvent.
///
/// The topic must look like `<namespace>/{zoneId}/notifications`.
pub fn normalize(namespace: &str, topic: &str, payload: &[u8]) -> Result<ZoneEvent, EngineError> {
  let zone_id = zone_from_topic(namespace, topic)?;
  let raw: InboundPayload = serde_json::from_slice(payload)?;
  let event = normalize_payload(raw)?;
  Ok(ZoneEvent { zone_id, event })
}

/// Extract the zone id (second segment) from a notifications topic.
pub fn zone_from_topic(namespace: &str, topic: &str) -> Result<String, EngineError> {
  let parts: Vec<&str> = topic.split('/').collect();
  match parts.as_slice() {
    [ns, zone, NOTIFICATIONS_SEGMENT] if *ns == namespace => {
      if zone.trim().is_empty() {
        return Err(EngineError::validation("topic", "zone id must not be empty"));
      }
      Ok(zone.to_string())
    }
    _ => Err(EngineError::parse(format!(
      "topic {:?} does not match {}/{{zoneId}}/{}",
      topic, namespace, NOTIFICATIONS_SEGMENT
    ))),
  }
}

/// Validate an already-decoded payload.
pub fn normalize_payload(raw: InboundPayload) -> Result<Event, EngineError> {
  if raw.is_completion_signal.unwrap_or(false) {
    let command = non_empty(raw.completed_command)
      .ok_or_else(|| EngineError::validation("completedCommand", "required for completion signals"))?;
    return Ok(Event::Completion { command });
  }

  let message = non_empty(raw.message)
    .ok_or_else(|| EngineError::validation("message", "must not be empty"))?;

  Ok(Event::Alert(AlertEvent {
    alert_type: non_empty(raw.alert_type).unwrap_or_else(|| DEFAULT_ALERT_TYPE.to_string()),
    message,
    suggestion: non_empty(raw.suggestion),
    suggestion_text: non_empty(raw.suggestion_text),
  }))
}

/// Treat missing and blank strings alike. Non-blank text is kept as published.
fn non_empty(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zone_is_second_topic_segment() {
    assert_eq!(zone_from_topic("ecohub", "ecohub/zone-7/notifications").unwrap(), "zone-7");
  }

  #[test]
  fn foreign_topics_are_rejected() {
    assert!(zone_from_topic("ecohub", "ecohub/zones/z1/status_update").is_err());
    assert!(zone_from_topic("ecohub", "other/z1/notifications").is_err());
    assert!(zone_from_topic("ecohub", "ecohub/z1/commands").is_err());
    let err = zone_from_topic("ecohub", "ecohub//notifications").unwrap_err();
    assert!(err.to_string().contains("zone id"));
  }

  #[test]
  fn alert_payload_normalized() {
    let payload = br#"{"type":"Too Hot","message":"temperature is too high (41)","suggestion":"TURN_FAN_ON"}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", payload).unwrap();
    assert_eq!(ev.zone_id, "z1");
    match ev.event {
      Event::Alert(a) => {
        assert_eq!(a.alert_type, "Too Hot");
        assert_eq!(a.suggestion.as_deref(), Some("TURN_FAN_ON"));
        assert!(a.suggestion_text.is_none());
      }
      other => panic!("expected alert, got {:?}", other),
    }
  }

  #[test]
  fn missing_type_defaults_to_system_and_blank_suggestion_is_absent() {
    let payload = br#"{"message":"hello","suggestion":"  "}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", payload).unwrap();
    assert_eq!(
      ev.event,
      Event::Alert(AlertEvent {
        alert_type: "System".into(),
        message: "hello".into(),
        suggestion: None,
        suggestion_text: None,
      })
    );
  }

  #[test]
  fn completion_signal_requires_command() {
    let ok = br#"{"isCompletionSignal":true,"completedCommand":"PUMP_ON"}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", ok).unwrap();
    assert_eq!(ev.event, Event::Completion { command: "PUMP_ON".into() });

    let missing = br#"{"isCompletionSignal":true}"#;
    let err = normalize("ecohub", "ecohub/z1/notifications", missing).unwrap_err();
    assert!(err.to_string().contains("completedCommand"));
  }

  #[test]
  fn null_completion_flag_is_an_ordinary_alert() {
    let payload = br#"{"type":"Too Hot","message":"hot","suggestion":"FAN_ON","isCompletionSignal":null}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", payload).unwrap();
    match ev.event {
      Event::Alert(a) => assert_eq!(a.suggestion.as_deref(), Some("FAN_ON")),
      other => panic!("expected alert, got {:?}", other),
    }

    let explicit_false = br#"{"message":"hot","isCompletionSignal":false,"completedCommand":"FAN_ON"}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", explicit_false).unwrap();
    assert!(matches!(ev.event, Event::Alert(_)));
  }

  #[test]
  fn published_text_is_stored_untrimmed() {
    let payload = br#"{"type":" Too Hot","message":"  temperature is 41 ","suggestion":"FAN_ON "}"#;
    let ev = normalize("ecohub", "ecohub/z1/notifications", payload).unwrap();
    assert_eq!(
      ev.event,
      Event::Alert(AlertEvent {
        alert_type: " Too Hot".into(),
        message: "  temperature is 41 ".into(),
        suggestion: Some("FAN_ON ".into()),
        suggestion_text: None,
      })
    );
  }

  #[test]
  fn malformed_json_is_an_error() {
    let err = normalize("ecohub", "ecohub/z1/notifications", b"{not json").unwrap_err();
    assert!(matches!(err, EngineError::Json(_)));
  }

  #[test]
  fn alert_without_message_is_rejected() {
    let err = normalize("ecohub", "ecohub/z1/notifications", br#"{"type":"Too Hot"}"#).unwrap_err();
    assert!(err.to_string().contains("message"));
  }
}
