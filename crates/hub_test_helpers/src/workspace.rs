//! Temporary FamilyHub workspaces

use assert_fs::TempDir;
use std::fs;
use std::path::PathBuf;

/// Temporary directory removed on drop
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Workspace with an empty `.familyhub/data` directory and no config file
///
/// ```rust
/// use hub_test_helpers::workspace::init_workspace;
///
/// let workspace = init_workspace();
/// assert!(workspace.path().join(".familyhub/data").is_dir());
/// ```
pub fn init_workspace() -> TempDir {
    let temp = temp_dir();
    fs::create_dir_all(data_dir(&temp)).expect("Failed to create .familyhub/data");
    temp
}

/// Workspace whose local cache already holds the given collections
///
/// Each entry is `(storage_key, json_array)`.
///
/// ```rust
/// use hub_test_helpers::workspace::workspace_with_collections;
///
/// let workspace = workspace_with_collections(&[
///     ("fh_shopping", r#"[{"id":"1","name":"Milk"}]"#),
/// ]);
/// assert!(workspace.path().join(".familyhub/data/fh_shopping.json").exists());
/// ```
pub fn workspace_with_collections(collections: &[(&str, &str)]) -> TempDir {
    let workspace = init_workspace();
    for (storage_key, json) in collections {
        let path = data_dir(&workspace).join(format!("{}.json", storage_key));
        fs::write(path, json).expect("Failed to write collection file");
    }
    workspace
}

/// Workspace configured against a remote at `url`
pub fn workspace_with_remote(url: &str, probe_on_start: bool) -> TempDir {
    let workspace = init_workspace();
    let config = format!(
        "[remote]\nurl = \"{}\"\napi_key = \"test-anon-key\"\ntimeout_secs = 2\nprobe_on_start = {}\n",
        url, probe_on_start
    );
    fs::write(workspace.path().join(".familyhub/config.toml"), config)
        .expect("Failed to write config.toml");
    workspace
}

fn data_dir(workspace: &TempDir) -> PathBuf {
    workspace.path().join(".familyhub").join("data")
}
