//! Weather Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Weather payload (`briefing/weather`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub humidity: Option<Value>,
    #[serde(default)]
    pub condition: Option<String>,
    /// Expected impact on transportation (e.g. "MODERATE")
    #[serde(default, alias = "weather_impact")]
    pub impact: Option<String>,
    /// Keys not covered above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeatherReport {
    /// Build a view from a payload; `None` when a known key has the wrong shape
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
