//! Payload models
//!
//! Lenient typed views over the per-category payloads published by the
//! cloud producers. Every field is optional and unknown keys are kept in
//! `extra`; a view fails only when a known key has the wrong shape.

pub mod market;
pub mod security;
pub mod weather;

// Re-exports
pub use market::{Commodity, IndexQuote, MarketSnapshot};
pub use security::{SecurityAlert, SecurityBriefing};
pub use weather::WeatherReport;

use serde_json::Value;

/// Render a scalar payload value as plain text
///
/// Strings are printed without quotes; `null` becomes `N/A`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a value as a number, accepting numeric strings like `"1,800"`
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("low")), "low");
        assert_eq!(display_value(&json!(72)), "72");
        assert_eq!(display_value(&Value::Null), "N/A");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&json!("1,800")), Some(1800.0));
        assert_eq!(as_number(&json!(70)), Some(70.0));
        assert_eq!(as_number(&json!("rising")), None);
    }
}
