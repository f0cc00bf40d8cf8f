//! Predicates over `hub` command output

use predicates::prelude::*;
use serde_json::Value;

/// Stderr contains none of `values`
///
/// ```rust
/// use hub_test_helpers::assertions::stderr_not_contains;
/// use predicates::prelude::*;
///
/// assert!(stderr_not_contains(&["ERROR", "WARN"]).eval("all good"));
/// ```
pub fn stderr_not_contains(values: &[&str]) -> impl Predicate<str> {
    let owned_values: Vec<String> = values.iter().map(|&s| s.to_string()).collect();
    predicate::function(move |s: &str| !owned_values.iter().any(|v| s.contains(v.as_str())))
}

/// Output is a JSON array with exactly `len` elements
pub fn json_array_of_len(len: usize) -> impl Predicate<str> {
    predicate::function(move |s: &str| {
        serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_array().map(Vec::len))
            == Some(len)
    })
}

/// Output is a JSON array with an element whose `id` is `id`
pub fn json_array_with_id(id: &str) -> impl Predicate<str> {
    let id = id.to_string();
    predicate::function(move |s: &str| {
        serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_array().cloned())
            .is_some_and(|rows| rows.iter().any(|row| row["id"] == Value::String(id.clone())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_not_contains() {
        assert!(stderr_not_contains(&["ERROR", "WARN"]).eval("Some output without errors"));
        assert!(!stderr_not_contains(&["ERROR"]).eval("ERROR: something went wrong"));
    }

    #[test]
    fn test_json_array_predicates() {
        let output = r#"[{"id":"1","name":"Milk"},{"id":"2"}]"#;
        assert!(json_array_of_len(2).eval(output));
        assert!(!json_array_of_len(1).eval(output));
        assert!(json_array_with_id("2").eval(output));
        assert!(!json_array_with_id("3").eval(output));
        assert!(!json_array_of_len(0).eval("not json"));
    }
}
