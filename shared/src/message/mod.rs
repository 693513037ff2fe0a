//! Inbound broker messages
//!
//! Producers publish one JSON object per category to `<prefix>/<category>`.
//! [`BriefingMessage::parse`] turns a raw `(topic, bytes)` pair into a
//! validated message; anything else becomes a [`MessageError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::category::Category;

/// Default subscription filter
pub const DEFAULT_TOPIC_FILTER: &str = "briefing/#";

/// Reasons an inbound message is discarded
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MessageError {
    /// Payload bytes are not UTF-8
    #[error("Payload on {topic} is not valid UTF-8")]
    InvalidUtf8 { topic: String },

    /// Payload is not parseable JSON
    #[error("Malformed JSON on {topic}: {reason}")]
    MalformedJson { topic: String, reason: String },

    /// Payload parsed but is not a JSON object
    #[error("Payload on {topic} is not a JSON object")]
    NotAnObject { topic: String },

    /// Topic has no usable last segment
    #[error("Cannot derive category from topic {topic:?}")]
    NoCategory { topic: String },
}

impl MessageError {
    pub fn topic(&self) -> &str {
        match self {
            MessageError::InvalidUtf8 { topic }
            | MessageError::MalformedJson { topic, .. }
            | MessageError::NotAnObject { topic }
            | MessageError::NoCategory { topic } => topic,
        }
    }
}

/// A validated category update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingMessage {
    pub topic: String,
    pub category: Category,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl BriefingMessage {
    /// Validate a raw broker delivery
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Self, MessageError> {
        let category = Category::from_topic(topic).ok_or_else(|| MessageError::NoCategory {
            topic: topic.to_string(),
        })?;

        let text = std::str::from_utf8(payload).map_err(|_| MessageError::InvalidUtf8 {
            topic: topic.to_string(),
        })?;

        let value: Value =
            serde_json::from_str(text).map_err(|e| MessageError::MalformedJson {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(MessageError::NotAnObject {
                topic: topic.to_string(),
            });
        }

        Ok(Self {
            topic: topic.to_string(),
            category,
            payload: value,
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_message() {
        let msg = BriefingMessage::parse("briefing/weather", br#"{"t":70}"#).unwrap();
        assert_eq!(msg.category, Category::weather());
        assert_eq!(msg.payload["t"], 70);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(matches!(
            BriefingMessage::parse("briefing/weather", b"{not json"),
            Err(MessageError::MalformedJson { .. })
        ));
        assert!(matches!(
            BriefingMessage::parse("briefing/weather", b"[1,2]"),
            Err(MessageError::NotAnObject { .. })
        ));
        assert!(matches!(
            BriefingMessage::parse("briefing/weather", &[0xff, 0xfe]),
            Err(MessageError::InvalidUtf8 { .. })
        ));
        let err = BriefingMessage::parse("briefing/", b"{}").unwrap_err();
        assert_eq!(err.topic(), "briefing/");
    }
}
