//! Typed, sanitizing wrapper over one remote table

use crate::entity::{Entity, Patch, ID_FIELD};
use crate::policy::FieldPolicy;
use crate::remote::{RemoteTable, CLEAR_SENTINEL_ID};
use crate::SyncError;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Whether a write reached the remote table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Nothing left to send after sanitization
    Skipped,
}

/// Outcome of one remote write, settled by the orchestrator
pub type SyncResult = crate::Result<Delivery>;

/// Remote mirror of one collection
///
/// Strips the collection's excluded fields before every write and decodes
/// fetched rows into `T`. Owns no state and never touches the local cache;
/// each call reports its outcome as a value.
pub struct RemoteAdapter<T: Entity> {
    collection: String,
    table: Arc<dyn RemoteTable>,
    policy: Arc<FieldPolicy>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> RemoteAdapter<T> {
    pub fn new(
        collection: impl Into<String>,
        table: Arc<dyn RemoteTable>,
        policy: Arc<FieldPolicy>,
    ) -> Self {
        Self {
            collection: collection.into(),
            table,
            policy,
            _entity: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// All rows of the table, decoded
    ///
    /// A single undecodable row fails the whole fetch so that a partial
    /// result never overwrites the local cache.
    pub async fn fetch_all(&self) -> crate::Result<Vec<T>> {
        let rows = self.table.select_all().await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    SyncError::InvalidPayload(format!("{} row: {}", self.table.name(), e))
                })
            })
            .collect()
    }

    pub async fn insert(&self, item: &T) -> SyncResult {
        let row = self.sanitize(item)?;
        self.table.insert(row).await?;
        Ok(Delivery::Sent)
    }

    /// Send the sanitized patch; skipped when nothing remains to send
    pub async fn update_by_id(&self, id: &str, patch: &Patch) -> SyncResult {
        let mut payload = patch.clone();
        payload.remove(ID_FIELD);
        self.policy.strip(&self.collection, &mut payload);

        if payload.is_empty() {
            return Ok(Delivery::Skipped);
        }
        self.table.update_by_id(id, payload).await?;
        Ok(Delivery::Sent)
    }

    pub async fn delete_by_id(&self, id: &str) -> SyncResult {
        self.table.delete_by_id(id).await?;
        Ok(Delivery::Sent)
    }

    /// Remove rows orphaned by a replacement; skipped for an empty id set
    pub async fn delete_where_id_not_in(&self, ids: &[String]) -> SyncResult {
        if ids.is_empty() {
            return Ok(Delivery::Skipped);
        }
        self.table.delete_where_id_not_in(ids).await?;
        Ok(Delivery::Sent)
    }

    /// Delete every row of the table
    pub async fn clear(&self) -> SyncResult {
        self.table.delete_where_id_ne(CLEAR_SENTINEL_ID).await?;
        Ok(Delivery::Sent)
    }

    pub async fn upsert_batch(&self, items: &[T]) -> SyncResult {
        if items.is_empty() {
            return Ok(Delivery::Skipped);
        }
        let rows = items
            .iter()
            .map(|item| self.sanitize(item))
            .collect::<crate::Result<Vec<Value>>>()?;
        self.table.upsert(rows).await?;
        Ok(Delivery::Sent)
    }

    fn sanitize(&self, item: &T) -> crate::Result<Value> {
        let mut fields: Map<String, Value> = match serde_json::to_value(item)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(SyncError::InvalidPayload(format!(
                    "entity {} does not serialize to an object",
                    item.id()
                )))
            }
        };
        self.policy.strip(&self.collection, &mut fields);
        Ok(Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewsItem;
    use crate::remote::{MemoryTable, RemoteOp};
    use serde_json::json;

    fn news_item(id: &str) -> NewsItem {
        serde_json::from_value(json!({
            "id": id,
            "title": "Ausflug",
            "readBy": ["mama"]
        }))
        .unwrap()
    }

    fn adapter(table: Arc<MemoryTable>) -> RemoteAdapter<NewsItem> {
        let policy = FieldPolicy::new().exclude("news", ["readBy"]);
        RemoteAdapter::new("news", table, Arc::new(policy))
    }

    #[tokio::test]
    async fn test_insert_strips_excluded_fields() {
        let table = Arc::new(MemoryTable::new("news"));
        let adapter = adapter(table.clone());

        assert_eq!(adapter.insert(&news_item("1")).await.unwrap(), Delivery::Sent);
        assert_eq!(
            table.rows(),
            vec![json!({"id": "1", "title": "Ausflug", "description": ""})]
        );
    }

    #[tokio::test]
    async fn test_update_with_only_excluded_fields_is_skipped() {
        let table = Arc::new(MemoryTable::with_rows("news", vec![json!({"id": "1"})]));
        let adapter = adapter(table.clone());

        let patch = json!({"readBy": ["papa"], "id": "1"}).as_object().cloned().unwrap();
        assert_eq!(adapter.update_by_id("1", &patch).await.unwrap(), Delivery::Skipped);
        assert!(table.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_sanitizes_every_row() {
        let table = Arc::new(MemoryTable::new("news"));
        let adapter = adapter(table.clone());

        adapter
            .upsert_batch(&[news_item("1"), news_item("2")])
            .await
            .unwrap();
        assert!(table.rows().iter().all(|row| row.get("readBy").is_none()));
        assert_eq!(table.calls(), vec![RemoteOp::Upsert]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_rows() {
        let table = Arc::new(MemoryTable::with_rows(
            "news",
            vec![json!({"id": "1", "title": "ok"}), json!({"id": "2"})],
        ));
        let adapter = adapter(table);

        let err = adapter.fetch_all().await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_fetch_accepts_null_columns() {
        let table = Arc::new(MemoryTable::with_rows(
            "news",
            vec![json!({"id": "r1", "title": "Remote", "description": null, "image": null})],
        ));

        let items = adapter(table).fetch_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "");
        assert!(items[0].image.is_none());
    }

    #[tokio::test]
    async fn test_errors_are_returned_not_raised() {
        let table = Arc::new(MemoryTable::new("news"));
        table.fail(RemoteOp::Delete);
        let adapter = adapter(table);

        let result = adapter.delete_by_id("1").await;
        assert!(matches!(result, Err(SyncError::Remote { status: 500, .. })));
    }
}
