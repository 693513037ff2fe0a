//! Aggregation bundle
//!
//! Latest payload per category. A bundle is complete once its key set
//! covers the required set; completion is always recomputed from the
//! current keys, never tracked incrementally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::category::Category;

/// Category → latest parsed payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBundle {
    entries: BTreeMap<Category, Value>,
}

impl DataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the payload for a category
    ///
    /// Returns the superseded payload, if any.
    pub fn insert(&mut self, category: Category, payload: Value) -> Option<Value> {
        self.entries.insert(category, payload)
    }

    pub fn get(&self, category: &Category) -> Option<&Value> {
        self.entries.get(category)
    }

    /// Look up by plain label
    pub fn get_str(&self, label: &str) -> Option<&Value> {
        self.entries.get(&Category::new(label))
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.entries.contains_key(category)
    }

    /// Whether every required category has a payload
    pub fn is_complete<'a, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'a Category>,
    {
        required.into_iter().all(|c| self.entries.contains_key(c))
    }

    /// Required categories that are still missing
    pub fn missing<'a, I>(&self, required: I) -> Vec<Category>
    where
        I: IntoIterator<Item = &'a Category>,
    {
        required
            .into_iter()
            .filter(|c| !self.entries.contains_key(*c))
            .cloned()
            .collect()
    }

    /// Move the contents out, leaving this bundle empty
    pub fn take(&mut self) -> DataBundle {
        std::mem::take(self)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Category, Value)> for DataBundle {
    fn from_iter<T: IntoIterator<Item = (Category, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
