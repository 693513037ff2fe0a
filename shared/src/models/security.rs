//! Security Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Single alert line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Security payload (`briefing/security`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityBriefing {
    /// Overall threat level ("low", "ELEVATED", ...)
    #[serde(default, alias = "security_level")]
    pub level: Option<String>,
    #[serde(default)]
    pub alerts: Vec<SecurityAlert>,
    /// Keys not covered above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SecurityBriefing {
    /// Build a view from a payload; `None` when a known key has the wrong shape
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_land_in_extra() {
        let b = SecurityBriefing::from_value(&json!({
            "security_level": "ELEVATED",
            "alerts": [{"title": "Port", "description": "closed"}],
            "lvl": "low"
        }))
        .unwrap();
        assert_eq!(b.level.as_deref(), Some("ELEVATED"));
        assert_eq!(b.alerts.len(), 1);
        assert_eq!(b.extra.get("lvl"), Some(&json!("low")));
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        assert!(SecurityBriefing::from_value(&json!({"alerts": "oops"})).is_none());
    }
}
