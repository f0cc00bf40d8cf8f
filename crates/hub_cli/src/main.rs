//! FamilyHub CLI - inspect and edit the family organizer collections
//!
//! Usage: hub <command> [options]

mod commands;

use clap::{Parser, Subcommand};
use hub_common::telemetry::LogFormat;
use hub_common::{HubError, EXIT_CONFIG_ERROR, EXIT_ERROR, EXIT_USAGE, HUB_DIR};
use hub_config::{Config, DEFAULT_CONFIG_TOML};
use std::path::Path;

#[derive(Parser)]
#[command(
    name = "hub",
    version,
    about = "FamilyHub local-first collections"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Log line format on stderr: text or json
    #[arg(long, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .familyhub/ with a default config and data directory
    Init,

    /// Show the backend mode and every registered collection
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print all records of a collection
    List {
        /// Collection name (see `hub status`)
        collection: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a record, e.g. '{"id":"1","name":"Milk"}'
    Add {
        collection: String,
        /// Record as a JSON object with a string "id"
        record: String,
    },

    /// Merge fields into the record with the given id
    Update {
        collection: String,
        id: String,
        /// Fields to change as a JSON object
        patch: String,
    },

    /// Remove the record with the given id
    Delete { collection: String, id: String },

    /// Replace the whole collection with a JSON array of records
    Set {
        collection: String,
        /// JSON array; '[]' empties the collection
        records: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    hub_common::telemetry::init_tracing(cli.verbose, cli.log_format);
    tracing::debug!("FamilyHub CLI started");

    let result = match cli.command {
        Commands::Init => cmd_init(),
        Commands::Status { json } => commands::status::cmd_status(json).await,
        Commands::List { collection, json } => commands::collection::cmd_list(&collection, json).await,
        Commands::Add { collection, record } => commands::collection::cmd_add(&collection, &record).await,
        Commands::Update {
            collection,
            id,
            patch,
        } => commands::collection::cmd_update(&collection, &id, &patch).await,
        Commands::Delete { collection, id } => commands::collection::cmd_delete(&collection, &id).await,
        Commands::Set {
            collection,
            records,
        } => commands::collection::cmd_set(&collection, &records).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<HubError>() {
        Some(HubError::ConfigError(_)) => EXIT_CONFIG_ERROR,
        Some(HubError::UnknownCollection(_)) | Some(HubError::ValidationError(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

/// Configuration of the workspace in the current directory
pub(crate) fn load_config() -> anyhow::Result<Config> {
    let cwd = std::env::current_dir()?;
    Ok(Config::load(&cwd)?)
}

fn cmd_init() -> anyhow::Result<()> {
    use std::fs;

    let hub_dir = Path::new(HUB_DIR);

    if !hub_dir.exists() {
        fs::create_dir(hub_dir)?;
        eprintln!("✓ Created {}/", HUB_DIR);
    } else {
        eprintln!("✓ {}/ already exists", HUB_DIR);
    }

    let data_dir = hub_dir.join("data");
    if !data_dir.exists() {
        fs::create_dir(&data_dir)?;
        eprintln!("✓ Created {}/data/", HUB_DIR);
    }

    let config_path = hub_dir.join("config.toml");
    if !config_path.exists() {
        fs::write(&config_path, DEFAULT_CONFIG_TOML)?;
        eprintln!("✓ Created {}/config.toml", HUB_DIR);
    } else {
        eprintln!("✓ {}/config.toml already exists", HUB_DIR);
    }

    // The config may hold an API key and data/ holds family records
    let gitignore_path = Path::new(".gitignore");
    let gitignore_entries = "\n# FamilyHub\n.familyhub/data/\n.familyhub/config.toml\n";

    if gitignore_path.exists() {
        let content = fs::read_to_string(gitignore_path)?;
        if !content.contains(".familyhub/data/") {
            fs::write(gitignore_path, format!("{}{}", content, gitignore_entries))?;
            eprintln!("✓ Updated .gitignore");
        }
    } else {
        fs::write(gitignore_path, gitignore_entries)?;
        eprintln!("✓ Created .gitignore");
    }

    eprintln!("\n✅ FamilyHub initialized");
    Ok(())
}
