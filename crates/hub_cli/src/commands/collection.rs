//! Collection commands: list, add, update, delete, set
//!
//! Records are handled untyped, so any registered collection can be edited
//! without knowing its record shape.

use anyhow::Result;
use hub_common::HubError;
use hub_sync::{registry, Collection, CollectionFactory, FileStorage, LocalCache, Patch, Record};
use serde_json::Value;
use std::sync::Arc;

async fn open(name: &str) -> Result<Arc<dyn Collection<Record>>> {
    let config = crate::load_config()?;
    let factory = CollectionFactory::init(&config).await;
    tracing::debug!("Opening {} ({})", name, factory.mode());
    Ok(factory.records(name)?)
}

/// Whether this device already holds `id`, without asking the remote
async fn cached_locally(name: &str, id: &str) -> Result<bool> {
    let config = crate::load_config()?;
    let spec = registry::find(name).ok_or_else(|| HubError::UnknownCollection(name.to_string()))?;
    let storage = Arc::new(FileStorage::new(config.data_dir()));
    let local: LocalCache<Record> =
        LocalCache::new(spec.name, spec.storage_key, registry::seed(spec.name), storage);
    Ok(local.contains(id).await)
}

fn parse_record(json: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| HubError::ValidationError(format!("record is not valid JSON: {}", e)))?;
    record_from_value(value)
}

fn record_from_value(value: Value) -> Result<Record> {
    match value.get("id") {
        Some(Value::String(id)) if !id.is_empty() => {}
        _ => {
            return Err(
                HubError::ValidationError("record needs a non-empty string \"id\"".to_string()).into(),
            )
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_patch(json: &str) -> Result<Patch> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(patch)) => Ok(patch),
        Ok(_) => Err(HubError::ValidationError("patch must be a JSON object".to_string()).into()),
        Err(e) => Err(HubError::ValidationError(format!("patch is not valid JSON: {}", e)).into()),
    }
}

fn parse_records(json: &str) -> Result<Vec<Record>> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(rows)) => rows.into_iter().map(record_from_value).collect(),
        Ok(_) => Err(HubError::ValidationError("records must be a JSON array".to_string()).into()),
        Err(e) => Err(HubError::ValidationError(format!("records are not valid JSON: {}", e)).into()),
    }
}

/// Short human label for a record: its name or title, if any
fn label(record: &Record) -> &str {
    ["name", "title", "mealName", "question", "dishName", "text"]
        .iter()
        .find_map(|key| record.get(key).and_then(Value::as_str))
        .unwrap_or("")
}

fn print_records(records: &[Record]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

pub async fn cmd_list(name: &str, json: bool) -> Result<()> {
    let collection = open(name).await?;
    let records = collection.get_all().await;

    if json {
        return print_records(&records);
    }

    if records.is_empty() {
        eprintln!("{} is empty", name);
        return Ok(());
    }
    for record in &records {
        println!("{:<24} {}", record.id, label(record));
    }
    eprintln!("\n{} record(s) in {}", records.len(), name);
    Ok(())
}

pub async fn cmd_add(name: &str, json: &str) -> Result<()> {
    let record = parse_record(json)?;
    let collection = open(name).await?;

    let id = record.id.clone();
    let existed = cached_locally(name, &id).await?;
    let records = collection.add(record).await;

    if existed {
        eprintln!("✓ {} already contains {}; nothing added", name, id);
    } else {
        eprintln!("✓ Added {} to {}", id, name);
    }
    print_records(&records)
}

pub async fn cmd_update(name: &str, id: &str, json: &str) -> Result<()> {
    let patch = parse_patch(json)?;
    let collection = open(name).await?;

    let known = cached_locally(name, id).await?;
    let records = collection.update(id, patch).await;

    if known {
        eprintln!("✓ Updated {} in {}", id, name);
    } else {
        eprintln!("✓ {} has no {}; nothing updated", name, id);
    }
    print_records(&records)
}

pub async fn cmd_delete(name: &str, id: &str) -> Result<()> {
    let collection = open(name).await?;

    let known = cached_locally(name, id).await?;
    let records = collection.delete(id).await;

    if known {
        eprintln!("✓ Deleted {} from {}", id, name);
    } else {
        eprintln!("✓ {} has no {}; nothing deleted", name, id);
    }
    print_records(&records)
}

pub async fn cmd_set(name: &str, json: &str) -> Result<()> {
    let records = parse_records(json)?;
    let collection = open(name).await?;

    let records = collection.set_all(records).await;
    eprintln!("✓ Replaced {} with {} record(s)", name, records.len());
    print_records(&records)
}
