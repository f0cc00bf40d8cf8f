//! Static list of the application's collections

use crate::entity::Entity;
use crate::model::FamilyMember;
use serde_json::Map;

/// Where one logical collection lives, locally and remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    /// Local storage key; kept stable so existing device data is found again
    pub storage_key: &'static str,
    /// Default remote table, overridable through `[tables]`
    pub table: &'static str,
}

const fn spec(name: &'static str, storage_key: &'static str, table: &'static str) -> CollectionSpec {
    CollectionSpec {
        name,
        storage_key,
        table,
    }
}

pub const COLLECTIONS: &[CollectionSpec] = &[
    spec("family", "fh_family", "family"),
    spec("events", "fh_events", "events"),
    spec("news", "fh_news", "news"),
    spec("polls", "fh_polls", "polls"),
    spec("shopping", "fh_shopping", "shopping"),
    spec("household_tasks", "fh_household", "household_tasks"),
    spec("personal_tasks", "fh_personal", "personal_tasks"),
    spec("meal_plan", "fh_mealPlan", "meal_plans"),
    spec("meal_requests", "fh_mealRequests", "meal_requests"),
    spec("recipes", "fh_recipes", "recipes"),
    spec("weather_favorites", "fh_weather_favs", "weather_favs"),
    spec("feedback", "fh_feedback", "feedback"),
    spec("notifications", "fh_notifications", "notifications"),
];

pub fn find(name: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|spec| spec.name == name)
}

/// The administrator account present on a fresh device
pub fn default_family() -> Vec<FamilyMember> {
    vec![FamilyMember {
        id: "admin_user".to_string(),
        name: "Administrator".to_string(),
        avatar: Some("https://ui-avatars.com/api/?name=Admin&background=000&color=fff".to_string()),
        color: Some("bg-gray-800 text-white".to_string()),
        role: Some("admin".to_string()),
        password: Some("admin".to_string()),
        extra: Map::new(),
    }]
}

/// Seed list of a registered collection, in any entity representation
///
/// Only `family` has a seed. A seed that does not fit `T` is dropped.
pub fn seed<T: Entity>(name: &str) -> Vec<T> {
    if name != "family" {
        return Vec::new();
    }
    default_family()
        .iter()
        .filter_map(|member| {
            serde_json::to_value(member)
                .and_then(serde_json::from_value)
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_keys_are_unique() {
        let names: HashSet<_> = COLLECTIONS.iter().map(|s| s.name).collect();
        let keys: HashSet<_> = COLLECTIONS.iter().map(|s| s.storage_key).collect();
        assert_eq!(names.len(), COLLECTIONS.len());
        assert_eq!(keys.len(), COLLECTIONS.len());
    }

    #[test]
    fn test_find() {
        let meal_plan = find("meal_plan").unwrap();
        assert_eq!(meal_plan.storage_key, "fh_mealPlan");
        assert_eq!(meal_plan.table, "meal_plans");
        assert!(find("unknown").is_none());
    }

    #[test]
    fn test_family_seed_in_any_representation() {
        let typed: Vec<FamilyMember> = seed("family");
        assert_eq!(typed, default_family());

        let untyped: Vec<Record> = seed("family");
        assert_eq!(untyped[0].id, "admin_user");
        assert_eq!(untyped[0].get("role"), Some(&serde_json::json!("admin")));

        assert!(seed::<Record>("shopping").is_empty());
    }
}
