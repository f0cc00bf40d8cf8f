//! Common types and errors for FamilyHub
//!
//! This crate provides the application-level error type, logging setup and
//! the log sanitizer shared by every FamilyHub crate.

pub mod sanitizer;
pub mod telemetry;

use thiserror::Error;

/// Application-level error types
///
/// Collection operations never surface errors to callers; these are for the
/// outer layers (configuration, CLI argument handling).
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, HubError>;

/// Directory (relative to the workspace root) holding config and local data
pub const HUB_DIR: &str = ".familyhub";

/// Exit code constants
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CONFIG_ERROR: i32 = 101;
