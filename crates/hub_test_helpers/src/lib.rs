//! Shared test utilities for FamilyHub test suites
//!
//! # Modules
//!
//! - [`workspace`]: temporary workspaces with a `.familyhub` layout
//! - [`cli`]: `hub` command builders with a clean environment
//! - [`logging`]: test logging configuration
//! - [`assertions`]: predicates over command output
//!
//! # Example
//!
//! ```rust,no_run
//! use hub_test_helpers::prelude::*;
//!
//! let workspace = init_workspace();
//! hub_command()
//!     .current_dir(workspace.path())
//!     .args(["list", "shopping", "--json"])
//!     .assert()
//!     .success()
//!     .stdout(json_array_of_len(0));
//! ```

pub mod assertions;
pub mod cli;
pub mod logging;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::cli::{command_for, hub_command};
    pub use crate::logging::{init_test_logging, suppress_logs};
    pub use crate::workspace::{init_workspace, temp_dir, workspace_with_collections, workspace_with_remote};
}
