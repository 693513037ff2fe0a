//! Market Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stock index quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub change: Option<Value>,
}

/// Commodity trend line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    #[serde(default)]
    pub price: Option<Value>,
    /// Unit suffix, e.g. "oz" or "bbl"
    #[serde(default)]
    pub unit: Option<String>,
    /// Trend strength on a 0-100 scale
    #[serde(default)]
    pub trend: Option<Value>,
    /// "Rising", "Stable", ...
    #[serde(default)]
    pub direction: Option<String>,
}

/// Market payload (`briefing/market`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub indices: Vec<IndexQuote>,
    #[serde(default)]
    pub commodities: Vec<Commodity>,
    /// Keys not covered above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarketSnapshot {
    /// Build a view from a payload; `None` when a known key has the wrong shape
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
