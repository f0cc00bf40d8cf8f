//! Fields that must never leave the device, per collection

use serde_json::Map;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Declarative map of collection name -> excluded field names
///
/// Consulted by every remote adapter before it writes; collections without
/// an entry send all fields.
#[derive(Debug, Clone, Default)]
pub struct FieldPolicy {
    excluded: HashMap<String, HashSet<String>>,
}

impl FieldPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add excluded fields for `collection`
    pub fn exclude<I, S>(mut self, collection: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded
            .entry(collection.to_string())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Build from the `[sanitize]` table of the configuration
    pub fn from_config(sanitize: &BTreeMap<String, Vec<String>>) -> Self {
        sanitize
            .iter()
            .fold(Self::new(), |policy, (collection, fields)| {
                policy.exclude(collection, fields.iter().cloned())
            })
    }

    /// Excluded field set for one collection (empty when unrestricted)
    pub fn excluded_for(&self, collection: &str) -> HashSet<String> {
        self.excluded.get(collection).cloned().unwrap_or_default()
    }

    /// Remove excluded fields of `collection` from a row in place
    pub fn strip(&self, collection: &str, row: &mut Map<String, serde_json::Value>) {
        if let Some(fields) = self.excluded.get(collection) {
            row.retain(|key, _| !fields.contains(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_only_listed_collection() {
        let policy = FieldPolicy::new().exclude("news", ["readBy"]);

        let mut news = json!({"id": "1", "title": "Hi", "readBy": ["a"]})
            .as_object()
            .cloned()
            .unwrap();
        policy.strip("news", &mut news);
        assert_eq!(serde_json::Value::Object(news), json!({"id": "1", "title": "Hi"}));

        let mut events = json!({"id": "1", "readBy": ["a"]}).as_object().cloned().unwrap();
        policy.strip("events", &mut events);
        assert!(events.contains_key("readBy"));
    }

    #[test]
    fn test_from_config() {
        let sanitize = BTreeMap::from([
            ("news".to_string(), vec!["readBy".to_string()]),
            ("family".to_string(), vec!["password".to_string(), "pin".to_string()]),
        ]);
        let policy = FieldPolicy::from_config(&sanitize);

        assert!(policy.excluded_for("news").contains("readBy"));
        assert_eq!(policy.excluded_for("family").len(), 2);
        assert!(policy.excluded_for("shopping").is_empty());
    }
}
