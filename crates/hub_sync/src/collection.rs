//! The collection contract shared by local-only and remote-backed collections

use crate::entity::{Entity, Patch};
use async_trait::async_trait;

/// Uniform read/write access to one named collection
///
/// Every method resolves to the collection's current local list and never
/// fails; callers adopt the returned list as their state. Whether a remote
/// backend sits behind the collection is not observable through this trait.
#[async_trait]
pub trait Collection<T: Entity>: Send + Sync {
    /// Logical collection name (`shopping`, `meal_plan`, ...)
    fn name(&self) -> &str;

    async fn get_all(&self) -> Vec<T>;

    /// Append `item`; a no-op when its id is already present
    async fn add(&self, item: T) -> Vec<T>;

    /// Shallow-merge `patch` into the entity with `id`; a no-op for unknown ids
    async fn update(&self, id: &str, patch: Patch) -> Vec<T>;

    /// Remove the entity with `id`; a no-op for unknown ids
    async fn delete(&self, id: &str) -> Vec<T>;

    /// Replace the whole collection with `items`, order preserved
    async fn set_all(&self, items: Vec<T>) -> Vec<T>;
}
