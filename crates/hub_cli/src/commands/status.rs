//! `hub status`: backend mode and local collection sizes

use anyhow::Result;
use hub_sync::registry::{self, COLLECTIONS};
use hub_sync::{Collection, CollectionFactory, LocalCache, Record};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CollectionStatus {
    name: &'static str,
    storage_key: &'static str,
    /// `None` when the collection stays on this device
    table: Option<String>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    mode: String,
    data_dir: String,
    collections: Vec<CollectionStatus>,
}

pub async fn cmd_status(json: bool) -> Result<()> {
    let config = crate::load_config()?;
    let factory = CollectionFactory::init(&config).await;

    let mut collections = Vec::with_capacity(COLLECTIONS.len());
    for spec in COLLECTIONS {
        // Read the local cache directly so status never triggers a fetch
        let local: LocalCache<Record> = LocalCache::new(
            spec.name,
            spec.storage_key,
            registry::seed(spec.name),
            factory.storage(),
        );
        collections.push(CollectionStatus {
            name: spec.name,
            storage_key: spec.storage_key,
            table: factory.table_for(spec.name),
            count: local.get_all().await.len(),
        });
    }

    let report = StatusReport {
        mode: factory.mode().to_string(),
        data_dir: config.data_dir().display().to_string(),
        collections,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend: {}", report.mode);
    println!("Data:    {}\n", report.data_dir);
    println!("{:<20} {:<18} {:<18} {:>5}", "COLLECTION", "STORAGE KEY", "TABLE", "COUNT");
    for c in &report.collections {
        println!(
            "{:<20} {:<18} {:<18} {:>5}",
            c.name,
            c.storage_key,
            c.table.as_deref().unwrap_or("-"),
            c.count
        );
    }
    Ok(())
}
