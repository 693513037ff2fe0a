//! Category naming
//!
//! A category is the logical data domain a message belongs to. It is never
//! carried inside the payload: producers publish to `<prefix>/<category>`
//! and the field device derives the category from the last topic segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data domain label (`weather`, `market`, `security`, ...)
///
/// Stored lowercase and trimmed so that `Weather` and `weather ` name the
/// same bundle slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const WEATHER: &'static str = "weather";
    pub const MARKET: &'static str = "market";
    pub const SECURITY: &'static str = "security";

    /// Create a category from any label
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_ascii_lowercase())
    }

    pub fn weather() -> Self {
        Self::new(Self::WEATHER)
    }

    pub fn market() -> Self {
        Self::new(Self::MARKET)
    }

    pub fn security() -> Self {
        Self::new(Self::SECURITY)
    }

    /// The default required set: weather, market and security
    pub fn defaults() -> Vec<Self> {
        vec![Self::weather(), Self::market(), Self::security()]
    }

    /// Derive the category from a concrete topic (`briefing/weather` → `weather`)
    ///
    /// Returns `None` when the last segment is empty (`briefing/`, `""`).
    pub fn from_topic(topic: &str) -> Option<Self> {
        let segment = topic.rsplit('/').next()?.trim();
        if segment.is_empty() {
            None
        } else {
            Some(Self::new(segment))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(format!("Invalid category: {:?}", s));
        }
        Ok(Self::new(trimmed))
    }
}

/// Parse a comma-separated category list (`"weather, market,security"`)
///
/// Empty entries are skipped; duplicates are kept once.
pub fn parse_category_list(s: &str) -> Result<Vec<Category>, String> {
    let mut out: Vec<Category> = Vec::new();
    for part in s.split(',').filter(|p| !p.trim().is_empty()) {
        let category: Category = part.parse()?;
        if !out.contains(&category) {
            out.push(category);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_topic_uses_last_segment() {
        assert_eq!(
            Category::from_topic("briefing/weather"),
            Some(Category::weather())
        );
        assert_eq!(
            Category::from_topic("site/a/b/Market"),
            Some(Category::market())
        );
        assert_eq!(Category::from_topic("security"), Some(Category::security()));
    }

    #[test]
    fn test_from_topic_rejects_empty_segment() {
        assert_eq!(Category::from_topic("briefing/"), None);
        assert_eq!(Category::from_topic(""), None);
    }

    #[test]
    fn test_parse_category_list() {
        let list = parse_category_list(" weather, market ,,security,weather").unwrap();
        assert_eq!(list, Category::defaults());
        assert!(parse_category_list("a/b").is_err());
    }
}
