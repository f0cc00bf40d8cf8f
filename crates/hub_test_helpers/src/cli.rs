//! CLI command builders for tests
//!
//! Commands run with `RUST_LOG=error` and without the remote credential
//! variables, so a developer's shell never turns a test remote-backed.

use assert_cmd::Command;

const REMOTE_ENV: [&str; 2] = ["FAMILYHUB_REMOTE_URL", "FAMILYHUB_REMOTE_KEY"];

/// Command for the `hub` binary with a clean environment
///
/// ```rust,no_run
/// use hub_test_helpers::cli::hub_command;
///
/// hub_command().arg("--version").assert().success();
/// ```
pub fn hub_command() -> Command {
    command_for("hub")
}

/// Command for any binary of the workspace with a clean environment
#[allow(deprecated)]
pub fn command_for(bin_name: &str) -> Command {
    let mut cmd = Command::cargo_bin(bin_name)
        .unwrap_or_else(|_| panic!("Failed to find {} binary", bin_name));
    cmd.env("RUST_LOG", "error");
    for var in REMOTE_ENV {
        cmd.env_remove(var);
    }
    cmd
}
