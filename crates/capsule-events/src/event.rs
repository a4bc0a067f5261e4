//! Telemetry event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl EventMetadata {
    /// Create fresh metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A telemetry event: a topic plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Dotted topic name, e.g. `capsule.status`.
    pub topic: String,
    /// Event payload.
    pub payload: Value,
    /// Event metadata.
    pub metadata: EventMetadata,
}

impl TelemetryEvent {
    /// Create an event with fresh metadata.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
            metadata: EventMetadata::new(),
        }
    }

    /// Whether the topic matches `pattern` (exact, or a trailing `*` prefix).
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => self.topic.starts_with(prefix),
            None => self.topic == pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_matching() {
        let event = TelemetryEvent::new("capsule.status", json!({}));
        assert!(event.matches("capsule.status"));
        assert!(event.matches("capsule.*"));
        assert!(event.matches("*"));
        assert!(!event.matches("capsule.proof"));
        assert!(!event.matches("capsule"));
    }

    #[test]
    fn test_metadata_is_unique() {
        let a = TelemetryEvent::new("t", json!(null));
        let b = TelemetryEvent::new("t", json!(null));
        assert_ne!(a.metadata.event_id, b.metadata.event_id);
    }
}
