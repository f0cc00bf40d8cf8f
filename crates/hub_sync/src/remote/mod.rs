//! Raw clients for remote tables
//!
//! A [`RemoteTable`] speaks rows (`serde_json::Value` objects keyed by a
//! string `id` column) and reports every outcome as a `Result`. Typing,
//! sanitization and the swallow-and-log policy live above it in
//! [`crate::adapter`] and [`crate::orchestrator`].

mod memory;
mod rest;

pub use memory::{MemoryBackend, MemoryTable};
pub use rest::{RestClient, RestTable};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Id that no real entity uses; `clear` deletes every row not carrying it
pub const CLEAR_SENTINEL_ID: &str = "0";

/// Remote operations, named for logs and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Select,
    Insert,
    Update,
    Delete,
    DeleteNotIn,
    Clear,
    Upsert,
}

impl RemoteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOp::Select => "select",
            RemoteOp::Insert => "insert",
            RemoteOp::Update => "update",
            RemoteOp::Delete => "delete",
            RemoteOp::DeleteNotIn => "delete_not_in",
            RemoteOp::Clear => "clear",
            RemoteOp::Upsert => "upsert",
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend table keyed by a string `id` column
#[async_trait]
pub trait RemoteTable: Send + Sync {
    /// Table name as known to the backend
    fn name(&self) -> &str;

    async fn select_all(&self) -> crate::Result<Vec<Value>>;

    async fn insert(&self, row: Value) -> crate::Result<()>;

    async fn update_by_id(&self, id: &str, patch: Map<String, Value>) -> crate::Result<()>;

    async fn delete_by_id(&self, id: &str) -> crate::Result<()>;

    /// Delete every row whose id is not in `ids`
    async fn delete_where_id_not_in(&self, ids: &[String]) -> crate::Result<()>;

    /// Delete every row whose id differs from `sentinel`
    async fn delete_where_id_ne(&self, sentinel: &str) -> crate::Result<()>;

    /// Insert-or-update each row by id
    async fn upsert(&self, rows: Vec<Value>) -> crate::Result<()>;
}
