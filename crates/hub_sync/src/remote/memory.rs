//! In-process remote table with failure injection

use super::{RemoteOp, RemoteTable};
use crate::entity::ID_FIELD;
use crate::SyncError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Value>,
    failing: HashSet<RemoteOp>,
    unreachable: bool,
    calls: Vec<RemoteOp>,
}

/// Table kept in memory, behaving like a PostgREST table keyed by `id`
///
/// Individual operations can be made to fail (`fail`) or the whole table made
/// unreachable, and every attempted operation is recorded in order.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    state: Mutex<TableState>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(TableState::default()),
        }
    }

    /// Table pre-populated with `rows`
    pub fn with_rows(name: impl Into<String>, rows: Vec<Value>) -> Self {
        let table = Self::new(name);
        table.lock().rows = rows;
        table
    }

    /// Reject `op` with a server error until healed
    pub fn fail(&self, op: RemoteOp) {
        self.lock().failing.insert(op);
    }

    /// Fail every operation as a dropped connection would
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Clear injected failures
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.unreachable = false;
    }

    pub fn rows(&self) -> Vec<Value> {
        self.lock().rows.clone()
    }

    /// Ids of stored rows, in storage order
    pub fn ids(&self) -> Vec<String> {
        self.lock().rows.iter().filter_map(row_id).map(str::to_string).collect()
    }

    /// Operations attempted so far, including failed ones
    pub fn calls(&self) -> Vec<RemoteOp> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and apply `f` unless a failure is injected
    fn run<R>(&self, op: RemoteOp, f: impl FnOnce(&mut Vec<Value>) -> crate::Result<R>) -> crate::Result<R> {
        let mut state = self.lock();
        state.calls.push(op);
        if state.unreachable {
            return Err(SyncError::Unreachable(format!("{} is offline", self.name)));
        }
        if state.failing.contains(&op) {
            return Err(SyncError::Remote {
                status: 500,
                message: format!("injected {} failure", op),
            });
        }
        f(&mut state.rows)
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get(ID_FIELD).and_then(Value::as_str)
}

fn merge_into(row: &mut Value, patch: &Map<String, Value>) {
    if let Some(fields) = row.as_object_mut() {
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn select_all(&self) -> crate::Result<Vec<Value>> {
        self.run(RemoteOp::Select, |rows| Ok(rows.clone()))
    }

    async fn insert(&self, row: Value) -> crate::Result<()> {
        self.run(RemoteOp::Insert, |rows| {
            let id = row_id(&row)
                .ok_or_else(|| SyncError::Remote {
                    status: 400,
                    message: "null value in column \"id\"".to_string(),
                })?
                .to_string();
            if rows.iter().any(|r| row_id(r) == Some(id.as_str())) {
                return Err(SyncError::Remote {
                    status: 409,
                    message: format!("duplicate key value: id={}", id),
                });
            }
            rows.push(row);
            Ok(())
        })
    }

    async fn update_by_id(&self, id: &str, patch: Map<String, Value>) -> crate::Result<()> {
        self.run(RemoteOp::Update, |rows| {
            if let Some(row) = rows.iter_mut().find(|r| row_id(r) == Some(id)) {
                merge_into(row, &patch);
            }
            Ok(())
        })
    }

    async fn delete_by_id(&self, id: &str) -> crate::Result<()> {
        self.run(RemoteOp::Delete, |rows| {
            rows.retain(|r| row_id(r) != Some(id));
            Ok(())
        })
    }

    async fn delete_where_id_not_in(&self, ids: &[String]) -> crate::Result<()> {
        self.run(RemoteOp::DeleteNotIn, |rows| {
            rows.retain(|r| row_id(r).is_some_and(|id| ids.iter().any(|keep| keep == id)));
            Ok(())
        })
    }

    async fn delete_where_id_ne(&self, sentinel: &str) -> crate::Result<()> {
        self.run(RemoteOp::Clear, |rows| {
            rows.retain(|r| row_id(r) == Some(sentinel));
            Ok(())
        })
    }

    async fn upsert(&self, incoming: Vec<Value>) -> crate::Result<()> {
        self.run(RemoteOp::Upsert, |rows| {
            for row in incoming {
                let existing = row_id(&row)
                    .and_then(|id| rows.iter().position(|r| row_id(r) == Some(id)));
                match (existing, row) {
                    (Some(index), Value::Object(fields)) => merge_into(&mut rows[index], &fields),
                    (_, row) => rows.push(row),
                }
            }
            Ok(())
        })
    }
}

/// A set of [`MemoryTable`]s created on first use, one per table name
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Arc<MemoryTable>>>,
    unreachable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the table called `name`, shared with every other caller
    pub fn table(&self, name: &str) -> Arc<MemoryTable> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .entry(name.to_string())
            .or_insert_with(|| {
                let table = MemoryTable::new(name);
                table.set_unreachable(self.unreachable.load(Ordering::SeqCst));
                Arc::new(table)
            })
            .clone()
    }

    /// Make every table, existing or created later, fail as if offline
    pub fn set_unreachable(&self, unreachable: bool) {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        self.unreachable.store(unreachable, Ordering::SeqCst);
        for table in tables.values() {
            table.set_unreachable(unreachable);
        }
    }
}
