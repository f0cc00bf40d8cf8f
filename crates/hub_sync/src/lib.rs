//! # FamilyHub Sync Layer
//!
//! Local-first record collections with a best-effort remote mirror.
//!
//! ## Architecture
//!
//! - **Local cache**: one JSON array per collection, always available
//! - **Remote adapter**: sanitized writes against a PostgREST table
//! - **Orchestrator**: optimistic local writes, remote wins on successful read
//! - **Factory**: decides once per process whether collections are remote-backed
//!
//! Every collection operation resolves to the local list. Remote failures are
//! logged and counted, never returned to the caller.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hub_sync::{Collection, CollectionFactory, ShoppingItem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = hub_config::Config::load(std::path::Path::new("."))?;
//!     let factory = CollectionFactory::init(&config).await;
//!     let hub = factory.hub();
//!
//!     let list = hub.shopping.add(ShoppingItem::new("1", "Milk")).await;
//!     assert_eq!(list.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod collection;
pub mod entity;
pub mod factory;
pub mod local;
pub mod model;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod remote;
pub mod storage;

pub use adapter::{Delivery, RemoteAdapter, SyncResult};
pub use collection::Collection;
pub use entity::{merge_patch, Entity, Patch, Record, ID_FIELD};
pub use factory::{BackendMode, CollectionFactory, Hub, RemoteTableProvider};
pub use local::{CacheCell, CacheCells, LocalCache};
pub use model::*;
pub use orchestrator::{RemoteStatus, SyncStats, SyncedCollection};
pub use policy::FieldPolicy;
pub use registry::{CollectionSpec, COLLECTIONS};
pub use remote::{MemoryBackend, MemoryTable, RemoteOp, RemoteTable, RestClient, RestTable};
pub use storage::{FileStorage, MemoryStorage, Storage};

/// Common result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors produced inside the sync layer
///
/// These never cross the collection contract; the orchestrator settles them
/// into log lines and counters.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    #[error("Remote rejected request (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Remote not configured: {0}")]
    NotConfigured(String),
}
