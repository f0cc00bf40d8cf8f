//! Collection factory: the one place that knows whether a remote exists

use crate::adapter::RemoteAdapter;
use crate::collection::Collection;
use crate::entity::{Entity, Record};
use crate::local::{CacheCells, LocalCache};
use crate::model::*;
use crate::orchestrator::SyncedCollection;
use crate::policy::FieldPolicy;
use crate::registry;
use crate::remote::{MemoryBackend, RemoteTable, RestClient};
use crate::storage::{FileStorage, Storage};
use hub_common::HubError;
use hub_config::{Config, RemoteConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Backend decided once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    LocalOnly,
    RemoteBacked,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::LocalOnly => f.write_str("local-only"),
            BackendMode::RemoteBacked => f.write_str("remote-backed"),
        }
    }
}

/// Source of remote table handles by table name
pub trait RemoteTableProvider: Send + Sync {
    fn table(&self, name: &str) -> Arc<dyn RemoteTable>;
}

impl RemoteTableProvider for RestClient {
    fn table(&self, name: &str) -> Arc<dyn RemoteTable> {
        Arc::new(RestClient::table(self, name))
    }
}

impl RemoteTableProvider for MemoryBackend {
    fn table(&self, name: &str) -> Arc<dyn RemoteTable> {
        MemoryBackend::table(self, name)
    }
}

/// Builds collections for the process
///
/// Remote availability is decided when the factory is created and never
/// revisited; a remote that becomes reachable later is only picked up by a
/// new factory. Every handle the factory builds for one storage key shares a
/// single cache cell.
pub struct CollectionFactory {
    mode: BackendMode,
    storage: Arc<dyn Storage>,
    cells: CacheCells,
    remote: Option<Arc<dyn RemoteTableProvider>>,
    tables: BTreeMap<String, String>,
    policy: Arc<FieldPolicy>,
}

impl CollectionFactory {
    /// Factory for the workspace described by `config`
    ///
    /// Never fails: a missing, malformed or unreachable remote yields a
    /// local-only factory.
    pub async fn init(config: &Config) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.data_dir()));
        let policy = FieldPolicy::from_config(&config.sanitize);

        let remote = match Self::connect(&config.remote).await {
            Ok(client) => {
                info!("Remote backend at {}", config.remote.url);
                Some(Arc::new(client) as Arc<dyn RemoteTableProvider>)
            }
            Err(e) if config.remote.is_configured() => {
                warn!("Remote backend unavailable, running local-only: {}", e);
                None
            }
            Err(e) => {
                info!("Running local-only: {}", e);
                None
            }
        };

        Self::with_parts(storage, remote, policy).with_table_overrides(config.tables.clone())
    }

    async fn connect(remote: &RemoteConfig) -> crate::Result<RestClient> {
        let client = RestClient::from_config(remote)?;
        if remote.probe_on_start {
            client.probe().await?;
        }
        Ok(client)
    }

    /// Factory from explicit parts; remote-backed exactly when `remote` is given
    pub fn with_parts(
        storage: Arc<dyn Storage>,
        remote: Option<Arc<dyn RemoteTableProvider>>,
        policy: FieldPolicy,
    ) -> Self {
        let mode = if remote.is_some() {
            BackendMode::RemoteBacked
        } else {
            BackendMode::LocalOnly
        };
        Self {
            mode,
            storage,
            cells: CacheCells::new(),
            remote,
            tables: BTreeMap::new(),
            policy: Arc::new(policy),
        }
    }

    pub fn local_only(storage: Arc<dyn Storage>) -> Self {
        Self::with_parts(storage, None, FieldPolicy::new())
    }

    /// Collection name -> table overrides; an empty table keeps it local
    pub fn with_table_overrides(mut self, tables: BTreeMap<String, String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Remote table mirroring `name`, if any
    pub fn table_for(&self, name: &str) -> Option<String> {
        match self.tables.get(name) {
            Some(table) if table.trim().is_empty() => None,
            Some(table) => Some(table.clone()),
            None => registry::find(name).map(|spec| spec.table.to_string()),
        }
    }

    /// Collection `name` persisted under `storage_key`
    ///
    /// Remote-backed when the factory has a remote and `name` maps to a
    /// table; otherwise the local cache alone.
    pub fn collection<T: Entity>(
        &self,
        name: &str,
        storage_key: &str,
        seed: Vec<T>,
    ) -> Arc<dyn Collection<T>> {
        let local = LocalCache::new(name, storage_key, seed, self.storage.clone())
            .with_cell(self.cells.cell(storage_key));

        match (&self.remote, self.table_for(name)) {
            (Some(provider), Some(table)) => {
                let adapter = RemoteAdapter::new(name, provider.table(&table), self.policy.clone());
                Arc::new(SyncedCollection::new(local, adapter))
            }
            _ => Arc::new(local),
        }
    }

    /// Registered collection `name` with its storage key and seed
    pub fn registered<T: Entity>(&self, name: &str) -> hub_common::Result<Arc<dyn Collection<T>>> {
        let spec =
            registry::find(name).ok_or_else(|| HubError::UnknownCollection(name.to_string()))?;
        Ok(self.collection(spec.name, spec.storage_key, registry::seed(spec.name)))
    }

    /// Registered collection as untyped records
    pub fn records(&self, name: &str) -> hub_common::Result<Arc<dyn Collection<Record>>> {
        self.registered::<Record>(name)
    }

    /// Typed handles for every registered collection
    pub fn hub(&self) -> Hub {
        Hub {
            mode: self.mode,
            family: self.registered_or_local("family"),
            events: self.registered_or_local("events"),
            news: self.registered_or_local("news"),
            polls: self.registered_or_local("polls"),
            shopping: self.registered_or_local("shopping"),
            household_tasks: self.registered_or_local("household_tasks"),
            personal_tasks: self.registered_or_local("personal_tasks"),
            meal_plan: self.registered_or_local("meal_plan"),
            meal_requests: self.registered_or_local("meal_requests"),
            recipes: self.registered_or_local("recipes"),
            weather_favorites: self.registered_or_local("weather_favorites"),
            feedback: self.registered_or_local("feedback"),
            notifications: self.registered_or_local("notifications"),
        }
    }

    fn registered_or_local<T: Entity>(&self, name: &str) -> Arc<dyn Collection<T>> {
        match registry::find(name) {
            Some(spec) => self.collection(spec.name, spec.storage_key, registry::seed(spec.name)),
            None => self.collection(name, name, Vec::new()),
        }
    }
}

/// The application's collections, built once and passed to consumers
#[derive(Clone)]
pub struct Hub {
    pub mode: BackendMode,
    pub family: Arc<dyn Collection<FamilyMember>>,
    pub events: Arc<dyn Collection<CalendarEvent>>,
    pub news: Arc<dyn Collection<NewsItem>>,
    pub polls: Arc<dyn Collection<Poll>>,
    pub shopping: Arc<dyn Collection<ShoppingItem>>,
    pub household_tasks: Arc<dyn Collection<Task>>,
    pub personal_tasks: Arc<dyn Collection<Task>>,
    pub meal_plan: Arc<dyn Collection<MealPlan>>,
    pub meal_requests: Arc<dyn Collection<MealRequest>>,
    pub recipes: Arc<dyn Collection<Recipe>>,
    pub weather_favorites: Arc<dyn Collection<SavedLocation>>,
    pub feedback: Arc<dyn Collection<FeedbackItem>>,
    pub notifications: Arc<dyn Collection<AppNotification>>,
}
