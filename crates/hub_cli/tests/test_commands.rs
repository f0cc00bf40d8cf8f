//! CLI integration tests

use hub_test_helpers::prelude::*;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_hub_help() {
    hub_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("FamilyHub"));
}

#[test]
fn test_hub_init() {
    let temp = temp_dir();

    hub_command()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("FamilyHub initialized"));

    assert!(temp.path().join(".familyhub/config.toml").exists());
    assert!(temp.path().join(".familyhub/data").is_dir());
    let gitignore = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".familyhub/data/"));
}

#[test]
fn test_hub_init_is_idempotent() {
    let temp = temp_dir();
    hub_command().current_dir(temp.path()).arg("init").assert().success();

    hub_command()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));

    let gitignore = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore.matches("# FamilyHub").count(), 1);
}

#[test]
fn test_list_fresh_family_shows_admin() {
    let workspace = init_workspace();

    hub_command()
        .current_dir(workspace.path())
        .args(["list", "family", "--json"])
        .assert()
        .success()
        .stdout(json_array_with_id("admin_user"));
}

#[test]
fn test_add_update_delete_roundtrip() {
    let workspace = init_workspace();
    let run = |args: &[&str]| {
        hub_command()
            .current_dir(workspace.path())
            .args(args)
            .assert()
            .success()
    };

    run(&["add", "shopping", r#"{"id":"1","name":"Milk"}"#]).stdout(json_array_of_len(1));
    run(&["update", "shopping", "1", r#"{"name":"Oat Milk"}"#])
        .stdout(predicate::str::contains("Oat Milk"));
    run(&["list", "shopping"]).stdout(predicate::str::contains("Oat Milk"));
    run(&["delete", "shopping", "1"]).stdout(json_array_of_len(0));

    let stored = fs::read_to_string(workspace.path().join(".familyhub/data/fh_shopping.json")).unwrap();
    assert_eq!(stored.trim(), "[]");
}

#[test]
fn test_duplicate_add_keeps_first_record() {
    let workspace = workspace_with_collections(&[("fh_shopping", r#"[{"id":"1","name":"Milk"}]"#)]);

    hub_command()
        .current_dir(workspace.path())
        .args(["add", "shopping", r#"{"id":"1","name":"Bread"}"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing added"))
        .stdout(predicate::str::contains("Milk").and(predicate::str::contains("Bread").not()));
}

#[test]
fn test_unknown_id_update_and_delete_report_noop() {
    let workspace = workspace_with_collections(&[("fh_shopping", r#"[{"id":"1","name":"Milk"}]"#)]);

    hub_command()
        .current_dir(workspace.path())
        .args(["update", "shopping", "zzz", r#"{"name":"x"}"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing updated").and(predicate::str::contains("Updated").not()))
        .stdout(json_array_of_len(1));

    hub_command()
        .current_dir(workspace.path())
        .args(["delete", "shopping", "zzz"])
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing deleted").and(predicate::str::contains("Deleted").not()))
        .stdout(json_array_with_id("1"));
}

#[test]
fn test_set_replaces_collection() {
    let workspace = workspace_with_collections(&[("fh_mealPlan", r#"[{"id":"old","day":"Montag"}]"#)]);

    hub_command()
        .current_dir(workspace.path())
        .args([
            "set",
            "meal_plan",
            r#"[{"id":"a","day":"Dienstag"},{"id":"b","day":"Mittwoch"}]"#,
        ])
        .assert()
        .success()
        .stdout(json_array_of_len(2).and(json_array_with_id("a")));

    hub_command()
        .current_dir(workspace.path())
        .args(["set", "meal_plan", "[]"])
        .assert()
        .success()
        .stdout(json_array_of_len(0));
}

#[test]
fn test_unknown_collection_is_usage_error() {
    let workspace = init_workspace();

    hub_command()
        .current_dir(workspace.path())
        .args(["list", "chores"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown collection: chores"));
}

#[test]
fn test_invalid_record_is_usage_error() {
    let workspace = init_workspace();

    hub_command()
        .current_dir(workspace.path())
        .args(["add", "shopping", r#"{"name":"no id"}"#])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("non-empty string"));
}

#[test]
fn test_malformed_config_exit_code() {
    let workspace = init_workspace();
    fs::write(workspace.path().join(".familyhub/config.toml"), "[remote\nurl =").unwrap();

    hub_command()
        .current_dir(workspace.path())
        .arg("status")
        .assert()
        .code(101)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_status_json_local_only() {
    let workspace = workspace_with_collections(&[("fh_news", r#"[{"id":"n1","title":"Hi"}]"#)]);

    let output = hub_command()
        .current_dir(workspace.path())
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "local-only");
    let collections = report["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 13);

    let news = collections.iter().find(|c| c["name"] == "news").unwrap();
    assert_eq!(news["count"], 1);
    assert_eq!(news["table"], "news");
    let family = collections.iter().find(|c| c["name"] == "family").unwrap();
    assert_eq!(family["count"], 1);
}

#[test]
fn test_corrupt_cache_falls_back_to_seed() {
    let workspace = workspace_with_collections(&[("fh_family", "{broken")]);

    hub_command()
        .current_dir(workspace.path())
        .args(["list", "family", "--json"])
        .assert()
        .success()
        .stdout(json_array_with_id("admin_user"))
        .stderr(stderr_not_contains(&["panicked"]));
}
