//! Sync orchestrator: local cache plus remote mirror behind one collection

use crate::adapter::{Delivery, RemoteAdapter, SyncResult};
use crate::collection::Collection;
use crate::entity::{Entity, Patch};
use crate::local::LocalCache;
use crate::remote::RemoteOp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// How one remote attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Ok,
    Failed,
    Skipped,
}

/// Per-collection remote outcome counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub remote_ok: u64,
    pub remote_failed: u64,
    pub remote_skipped: u64,
    /// Reads answered from the local cache because the fetch failed
    pub fetch_fallbacks: u64,
    pub last_remote_ok: Option<DateTime<Utc>>,
}

/// Collection whose writes apply locally first and are then mirrored remotely
///
/// Remote outcomes never reach the caller: every method returns the local
/// list. A successful `get_all` replaces the local list with the remote one.
pub struct SyncedCollection<T: Entity> {
    name: String,
    local: LocalCache<T>,
    remote: RemoteAdapter<T>,
    stats: Mutex<SyncStats>,
}

impl<T: Entity> SyncedCollection<T> {
    pub fn new(local: LocalCache<T>, remote: RemoteAdapter<T>) -> Self {
        Self {
            name: <LocalCache<T> as Collection<T>>::name(&local).to_string(),
            local,
            remote,
            stats: Mutex::new(SyncStats::default()),
        }
    }

    pub fn local(&self) -> &LocalCache<T> {
        &self.local
    }

    pub fn table_name(&self) -> &str {
        self.remote.table_name()
    }

    pub fn stats(&self) -> SyncStats {
        self.lock_stats().clone()
    }

    fn lock_stats(&self) -> MutexGuard<'_, SyncStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Single decision point for remote outcomes: log and count
    fn settle(&self, op: RemoteOp, result: SyncResult) -> RemoteStatus {
        let table = self.remote.table_name();
        let mut stats = self.lock_stats();

        match result {
            Ok(Delivery::Sent) => {
                debug!(collection = %self.name, table, op = %op, "remote op ok");
                stats.remote_ok += 1;
                stats.last_remote_ok = Some(Utc::now());
                RemoteStatus::Ok
            }
            Ok(Delivery::Skipped) => {
                debug!(collection = %self.name, table, op = %op, "remote op skipped");
                stats.remote_skipped += 1;
                RemoteStatus::Skipped
            }
            Err(e) => {
                warn!(collection = %self.name, table, op = %op, error = %e, "remote op failed");
                stats.remote_failed += 1;
                RemoteStatus::Failed
            }
        }
    }
}

#[async_trait]
impl<T: Entity> Collection<T> for SyncedCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_all(&self) -> Vec<T> {
        match self.remote.fetch_all().await {
            Ok(items) => {
                self.settle(RemoteOp::Select, Ok(Delivery::Sent));
                self.local.apply_set_all(items).items
            }
            Err(e) => {
                self.settle(RemoteOp::Select, Err(e));
                self.lock_stats().fetch_fallbacks += 1;
                self.local.snapshot()
            }
        }
    }

    async fn add(&self, item: T) -> Vec<T> {
        let remote_copy = item.clone();
        let applied = self.local.apply_add(item);
        if applied.changed {
            let result = self.remote.insert(&remote_copy).await;
            self.settle(RemoteOp::Insert, result);
        }
        applied.items
    }

    async fn update(&self, id: &str, patch: Patch) -> Vec<T> {
        let applied = self.local.apply_update(id, &patch);
        if applied.changed {
            let result = self.remote.update_by_id(id, &patch).await;
            self.settle(RemoteOp::Update, result);
        }
        applied.items
    }

    async fn delete(&self, id: &str) -> Vec<T> {
        let applied = self.local.apply_delete(id);
        if applied.changed {
            let result = self.remote.delete_by_id(id).await;
            self.settle(RemoteOp::Delete, result);
        }
        applied.items
    }

    async fn set_all(&self, items: Vec<T>) -> Vec<T> {
        let applied = self.local.apply_set_all(items);

        if applied.items.is_empty() {
            let result = self.remote.clear().await;
            self.settle(RemoteOp::Clear, result);
            return applied.items;
        }

        let keep: Vec<String> = applied
            .items
            .iter()
            .map(|item| item.id().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        // Both requests go out regardless of the other's outcome
        let deleted = self.remote.delete_where_id_not_in(&keep).await;
        self.settle(RemoteOp::DeleteNotIn, deleted);
        let upserted = self.remote.upsert_batch(&applied.items).await;
        self.settle(RemoteOp::Upsert, upserted);

        applied.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use crate::policy::FieldPolicy;
    use crate::remote::MemoryTable;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn synced(table: Arc<MemoryTable>) -> SyncedCollection<Record> {
        let local = LocalCache::new("shopping", "fh_shopping", vec![], Arc::new(MemoryStorage::new()));
        let remote = RemoteAdapter::new("shopping", table, Arc::new(FieldPolicy::new()));
        SyncedCollection::new(local, remote)
    }

    fn patch(value: serde_json::Value) -> Patch {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_get_all_remote_wins() {
        let table = Arc::new(MemoryTable::with_rows(
            "shopping",
            vec![json!({"id": "r1", "name": "Bread"})],
        ));
        let synced = synced(table);
        synced.local().apply_add(Record::new("l1").with("name", "Local only"));

        let list = synced.get_all().await;
        assert_eq!(list, vec![Record::new("r1").with("name", "Bread")]);
        assert_eq!(synced.local().snapshot(), list);

        let stats = synced.stats();
        assert_eq!((stats.remote_ok, stats.remote_failed), (1, 0));
        assert!(stats.last_remote_ok.is_some());
    }

    #[tokio::test]
    async fn test_get_all_falls_back_when_offline() {
        let table = Arc::new(MemoryTable::new("shopping"));
        let synced = synced(table.clone());
        synced.add(Record::new("1").with("name", "Milk")).await;

        table.set_unreachable(true);
        let list = synced.get_all().await;

        assert_eq!(list, vec![Record::new("1").with("name", "Milk")]);
        let stats = synced.stats();
        assert_eq!(stats.fetch_fallbacks, 1);
        assert_eq!(stats.remote_failed, 1);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_local_write() {
        let table = Arc::new(MemoryTable::new("shopping"));
        table.fail(RemoteOp::Insert);
        let synced = synced(table.clone());

        let list = synced.add(Record::new("1").with("name", "Milk")).await;

        assert_eq!(list.len(), 1);
        assert!(table.rows().is_empty());
        assert_eq!(synced.stats().remote_failed, 1);
        assert!(synced.stats().last_remote_ok.is_none());
    }

    #[tokio::test]
    async fn test_noops_make_no_remote_call() {
        let table = Arc::new(MemoryTable::new("shopping"));
        let synced = synced(table.clone());
        synced.add(Record::new("1")).await;

        synced.add(Record::new("1").with("name", "dup")).await;
        synced.update("missing", patch(json!({"name": "x"}))).await;
        synced.delete("missing").await;

        assert_eq!(table.calls(), vec![RemoteOp::Insert]);
    }

    #[tokio::test]
    async fn test_set_all_issues_both_requests_even_if_one_fails() {
        let table = Arc::new(MemoryTable::with_rows(
            "shopping",
            vec![json!({"id": "old"}), json!({"id": "a"})],
        ));
        table.fail(RemoteOp::DeleteNotIn);
        let synced = synced(table.clone());

        let items = vec![Record::new("a").with("n", 1), Record::new("b").with("n", 2)];
        let list = synced.set_all(items.clone()).await;

        assert_eq!(list, items);
        assert_eq!(table.calls(), vec![RemoteOp::DeleteNotIn, RemoteOp::Upsert]);
        assert_eq!(table.ids(), vec!["old", "a", "b"]);
        let stats = synced.stats();
        assert_eq!((stats.remote_ok, stats.remote_failed), (1, 1));
    }

    #[tokio::test]
    async fn test_set_all_empty_clears_remote() {
        let table = Arc::new(MemoryTable::with_rows("shopping", vec![json!({"id": "x"})]));
        let synced = synced(table.clone());

        assert!(synced.set_all(vec![]).await.is_empty());
        assert_eq!(table.calls(), vec![RemoteOp::Clear]);
        assert!(table.rows().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_local_only_field_is_skipped() {
        let table = Arc::new(MemoryTable::new("news"));
        let local = LocalCache::new("news", "fh_news", vec![], Arc::new(MemoryStorage::new()));
        let policy = FieldPolicy::new().exclude("news", ["readBy"]);
        let synced = SyncedCollection::new(local, RemoteAdapter::new("news", table.clone(), Arc::new(policy)));
        synced.add(Record::new("n1").with("title", "Hi")).await;

        let list = synced.update("n1", patch(json!({"readBy": ["mama"]}))).await;

        assert_eq!(list[0].get("readBy"), Some(&json!(["mama"])));
        assert_eq!(table.calls(), vec![RemoteOp::Insert]);
        assert_eq!(synced.stats().remote_skipped, 1);
    }

    #[tokio::test]
    async fn test_set_all_then_offline_read_returns_items_in_order() {
        let table = Arc::new(MemoryTable::with_rows("shopping", vec![json!({"id": "old"})]));
        let synced = synced(table.clone());
        let items = vec![Record::new("c").with("n", 3), Record::new("a").with("n", 1), Record::new("b")];

        synced.set_all(items.clone()).await;
        table.set_unreachable(true);

        assert_eq!(synced.get_all().await, items);
        assert_eq!(synced.stats().fetch_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_set_all_empty_then_offline_read_is_empty() {
        let table = Arc::new(MemoryTable::new("shopping"));
        let synced = synced(table.clone());
        synced.add(Record::new("1").with("name", "Milk")).await;

        synced.set_all(vec![]).await;
        table.set_unreachable(true);

        assert!(synced.get_all().await.is_empty());
        assert_eq!(synced.local().snapshot(), Vec::<Record>::new());
    }
}
