//! Local cache: the durable, always-available copy of a collection

use crate::collection::Collection;
use crate::entity::{merge_patch, Entity, Patch};
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Result of a local mutation
#[derive(Debug, Clone)]
pub(crate) struct Applied<T> {
    pub items: Vec<T>,
    /// False when the mutation was a defined no-op (duplicate or unknown id)
    pub changed: bool,
}

/// What a cache cell knows about its storage key
#[derive(Debug, Default)]
enum Slot {
    #[default]
    Unloaded,
    /// Nothing usable stored; readers fall back to their seed
    Empty,
    Json(String),
}

/// Latest contents of one storage key, shared by every cache handle on it
///
/// The list is kept serialized so that handles of different entity types
/// (typed models and untyped records) can share it. A write that could not
/// be persisted stays in the cell for the life of the process.
#[derive(Debug, Default)]
pub struct CacheCell {
    slot: Mutex<Slot>,
}

impl CacheCell {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One [`CacheCell`] per storage key, created on first use
#[derive(Debug, Default)]
pub struct CacheCells {
    cells: Mutex<HashMap<String, Arc<CacheCell>>>,
}

impl CacheCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, storage_key: &str) -> Arc<CacheCell> {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.entry(storage_key.to_string()).or_default().clone()
    }
}

/// Per-collection cache persisted through a [`Storage`] backend
///
/// The contents are loaded lazily from storage on first access and written
/// through on every change. Handles built over the same [`CacheCell`] see
/// each other's writes; the cell lock is held for the whole
/// read-modify-write, never across an `.await`. A failed write is logged and
/// the cell keeps the change, so the process carries on with the newer state
/// even though it is not durable.
pub struct LocalCache<T: Entity> {
    name: String,
    storage_key: String,
    seed: Vec<T>,
    storage: Arc<dyn Storage>,
    cell: Arc<CacheCell>,
}

impl<T: Entity> LocalCache<T> {
    /// Cache with a private cell
    pub fn new(
        name: impl Into<String>,
        storage_key: impl Into<String>,
        seed: Vec<T>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            name: name.into(),
            storage_key: storage_key.into(),
            seed,
            storage,
            cell: Arc::new(CacheCell::new()),
        }
    }

    /// Share `cell` with other handles on the same storage key
    pub fn with_cell(mut self, cell: Arc<CacheCell>) -> Self {
        self.cell = cell;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// True when an entity with `id` is cached
    pub async fn contains(&self, id: &str) -> bool {
        self.with_items(|items| items.iter().any(|item| item.id() == id))
    }

    pub(crate) fn apply_add(&self, item: T) -> Applied<T> {
        self.mutate(|items| {
            if items.iter().any(|existing| existing.id() == item.id()) {
                debug!(collection = %self.name, id = item.id(), "add skipped: id exists");
                return false;
            }
            items.push(item);
            true
        })
    }

    pub(crate) fn apply_update(&self, id: &str, patch: &Patch) -> Applied<T> {
        self.mutate(|items| {
            let Some(entity) = items.iter_mut().find(|item| item.id() == id) else {
                debug!(collection = %self.name, id, "update skipped: unknown id");
                return false;
            };
            match merge_patch(entity, patch) {
                Ok(merged) => {
                    *entity = merged;
                    true
                }
                Err(e) => {
                    warn!(collection = %self.name, id, error = %e, "update skipped: patch does not fit record");
                    false
                }
            }
        })
    }

    pub(crate) fn apply_delete(&self, id: &str) -> Applied<T> {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| item.id() != id);
            items.len() != before
        })
    }

    pub(crate) fn apply_set_all(&self, replacement: Vec<T>) -> Applied<T> {
        self.mutate(move |items| {
            *items = replacement;
            true
        })
    }

    /// Current list (loading it on first use)
    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.with_items(|items| items.to_vec())
    }

    fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let mut slot = self.lock();
        self.load(&mut slot);
        f(&self.decode(&slot))
    }

    fn mutate<F>(&self, f: F) -> Applied<T>
    where
        F: FnOnce(&mut Vec<T>) -> bool,
    {
        let mut slot = self.lock();
        self.load(&mut slot);
        let mut items = self.decode(&slot);
        let changed = f(&mut items);
        if changed {
            self.persist(&mut slot, &items);
        }
        Applied { items, changed }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.cell.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, slot: &mut Slot) {
        if matches!(slot, Slot::Unloaded) {
            *slot = self.read_stored();
        }
    }

    fn read_stored(&self) -> Slot {
        match self.storage.load(&self.storage_key) {
            Ok(Some(json)) => {
                debug!(collection = %self.name, bytes = json.len(), "loaded local cache");
                Slot::Json(json)
            }
            Ok(None) => Slot::Empty,
            Err(e) => {
                warn!(collection = %self.name, error = %e, "local storage read failed, using seed");
                Slot::Empty
            }
        }
    }

    /// Cached list, or the seed when nothing usable is cached
    fn decode(&self, slot: &Slot) -> Vec<T> {
        match slot {
            Slot::Json(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                warn!(collection = %self.name, error = %e, "stored collection unreadable, using seed");
                self.seed.clone()
            }),
            Slot::Unloaded | Slot::Empty => self.seed.clone(),
        }
    }

    fn persist(&self, slot: &mut Slot, items: &[T]) {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                warn!(collection = %self.name, error = %e, "local cache encode failed; change not kept");
                return;
            }
        };

        if let Err(e) = self.storage.store(&self.storage_key, &json) {
            warn!(
                collection = %self.name,
                key = %self.storage_key,
                error = %e,
                "local persistence failed; change kept in memory only"
            );
        }
        *slot = Slot::Json(json);
    }
}

#[async_trait]
impl<T: Entity> Collection<T> for LocalCache<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_all(&self) -> Vec<T> {
        self.snapshot()
    }

    async fn add(&self, item: T) -> Vec<T> {
        self.apply_add(item).items
    }

    async fn update(&self, id: &str, patch: Patch) -> Vec<T> {
        self.apply_update(id, &patch).items
    }

    async fn delete(&self, id: &str) -> Vec<T> {
        self.apply_delete(id).items
    }

    async fn set_all(&self, items: Vec<T>) -> Vec<T> {
        self.apply_set_all(items).items
    }
}
