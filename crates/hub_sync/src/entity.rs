//! Entity identity and partial updates

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identity field, locally and in every remote table
pub const ID_FIELD: &str = "id";

/// Partial entity: field name -> new value, merged shallowly
pub type Patch = Map<String, Value>;

/// A record with a stable, caller-assigned string id
///
/// Entities must serialize to a JSON object that carries the id under
/// [`ID_FIELD`]; patches and remote sanitization operate on that object.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Apply `patch` on top of `entity`, field by field
///
/// The `id` key of a patch is ignored so a merge can never re-key an entity.
/// Fails when the entity is not an object or the merged object no longer
/// deserializes as `T` (for example a string written into a boolean field).
pub fn merge_patch<T: Entity>(entity: &T, patch: &Patch) -> crate::Result<T> {
    let mut value = serde_json::to_value(entity)?;
    let fields = value.as_object_mut().ok_or_else(|| {
        crate::SyncError::InvalidPayload(format!(
            "entity {} does not serialize to an object",
            entity.id()
        ))
    })?;

    for (key, field) in patch {
        if key == ID_FIELD {
            continue;
        }
        fields.insert(key.clone(), field.clone());
    }

    Ok(serde_json::from_value(value)?)
}

/// Untyped entity: an id plus whatever fields the collection stores
///
/// Used where the record shape is not known at compile time (the CLI,
/// ad-hoc collections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Patch {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_record_roundtrip_keeps_fields() {
        let record: Record =
            serde_json::from_value(json!({"id": "1", "name": "Milk", "checked": false})).unwrap();
        assert_eq!(record.id(), "1");
        assert_eq!(record.get("name"), Some(&json!("Milk")));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": "1", "name": "Milk", "checked": false}));
    }

    #[test]
    fn test_merge_overwrites_and_adds_fields() {
        let record = Record::new("1").with("name", "Milk").with("checked", false);
        let merged = merge_patch(&record, &patch(json!({"name": "Oat Milk", "note": "2x"}))).unwrap();

        assert_eq!(merged.get("name"), Some(&json!("Oat Milk")));
        assert_eq!(merged.get("checked"), Some(&json!(false)));
        assert_eq!(merged.get("note"), Some(&json!("2x")));
    }

    #[test]
    fn test_merge_never_changes_id() {
        let record = Record::new("1").with("name", "Milk");
        let merged = merge_patch(&record, &patch(json!({"id": "2", "name": "Bread"}))).unwrap();

        assert_eq!(merged.id(), "1");
        assert_eq!(merged.get("name"), Some(&json!("Bread")));
    }

    #[test]
    fn test_merge_type_mismatch_fails() {
        let item = crate::ShoppingItem::new("1", "Milk");
        let result = merge_patch(&item, &patch(json!({"checked": "yes"})));
        assert!(result.is_err());
    }
}
