/// refdb CLI - CRUD over a local snapshot file
///
/// Usage:
///   refdb insert <path> <json> [--id <id>]  - Insert an item
///   refdb get <path> <id>                   - Show an item
///   refdb list <path>                       - Show every item under a path
///   refdb update <path> <id> <json>         - Replace an item
///   refdb patch <path> <id> <json>          - Overwrite some fields of an item
///   refdb delete <path> <id>                - Delete an item
///   refdb delete-all <path>                 - Delete everything under a path
///   refdb exists <path> [id]                - Check whether data exists
///   refdb dump                              - Print the raw stored tree
///
/// JSON arguments may contain date markers (`{"value": <ms>, "type": "date"}`);
/// they are read as timestamps.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use refdb::{MemoryStore, RefDb, RefDbConfig, RefDbError, Value, persistence};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "refdb")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Snapshot file path (default: ~/.refdb/db.json)
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    /// Prefix joined in front of every path
    #[arg(short, long, global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert an item under a generated (or given) id
    Insert {
        path: String,
        /// Item as JSON object
        data: String,
        /// Use this id instead of generating one
        #[arg(long)]
        id: Option<String>,
    },

    /// Show an item
    Get { path: String, id: String },

    /// Show every item under a path
    List { path: String },

    /// Replace an item
    Update {
        path: String,
        id: String,
        /// Item as JSON object
        data: String,
    },

    /// Overwrite some fields of an item (null deletes a field)
    Patch {
        path: String,
        id: String,
        /// Fields as JSON object
        fields: String,
    },

    /// Delete an item
    Delete { path: String, id: String },

    /// Delete everything under a path
    DeleteAll { path: String },

    /// Check whether anything is stored at a path or item
    Exists { path: String, id: Option<String> },

    /// Print the raw stored tree
    Dump,
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Insert { .. }
                | Commands::Update { .. }
                | Commands::Patch { .. }
                | Commands::Delete { .. }
                | Commands::DeleteAll { .. }
        )
    }
}

/// Get the default snapshot path (~/.refdb/db.json)
fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".refdb").join("db.json"))
}

/// Load the snapshot, or start empty if there is none yet
async fn load_store(path: &Path) -> Result<MemoryStore> {
    if !persistence::exists(path).await {
        tracing::debug!("no snapshot at {}, starting empty", path.display());
        return Ok(MemoryStore::new());
    }
    persistence::load(path)
        .await
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Parse a JSON argument, reading date markers as timestamps
fn parse_value(raw: &str) -> Result<Value> {
    let json: JsonValue =
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON value: {}", raw))?;
    Ok(refdb::parse(&Value::from(json)))
}

/// Format a value for pretty printing
fn format_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

async fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };

    let mut config = RefDbConfig::from_env();
    if let Some(prefix) = cli.prefix {
        config = config.with_path_prefix(prefix);
    }

    let store = load_store(&db_path).await?;
    let db = RefDb::with_config(store, config);
    let mutates = cli.command.mutates();

    match cli.command {
        Commands::Insert { path, data, id } => {
            let data = parse_value(&data)?;
            let id = match id {
                Some(id) => db.insert_with_id(&path, &id, &data).await?,
                None => db.insert(&path, &data).await?,
            };
            println!("{}", "OK".green().bold());
            println!("  Inserted: {}/{}", path.cyan(), id.cyan());
        }

        Commands::Get { path, id } => {
            let item = db.get(&path, &id).await?;
            println!("{}", format_value(&item));
        }

        Commands::List { path } => {
            let items = db.get_all(&path).await?;
            if items.is_empty() {
                println!("{}", "No items found".yellow());
            }
            for item in &items {
                println!("{}", format_value(item));
            }
        }

        Commands::Update { path, id, data } => {
            let data = parse_value(&data)?;
            db.update(&path, &id, &data).await?;
            println!("{}", "OK".green().bold());
            println!("  Updated: {}/{}", path.cyan(), id.cyan());
        }

        Commands::Patch { path, id, fields } => {
            let fields = parse_value(&fields)?;
            let item = db.update_fields_and_get(&path, &id, &fields).await?;
            println!("{}", format_value(&item));
        }

        Commands::Delete { path, id } => {
            db.delete(&path, &id).await?;
            println!("{}", "OK".green().bold());
            println!("  Deleted: {}/{}", path.cyan(), id.cyan());
        }

        Commands::DeleteAll { path } => {
            db.delete_all(&path).await?;
            println!("{}", "OK".green().bold());
            println!("  Cleared: {}", path.cyan());
        }

        Commands::Exists { path, id } => {
            let found = db.exists(&path, id.as_deref()).await?;
            println!("{}", found);
        }

        Commands::Dump => {
            let tree = db.store().snapshot().await;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }

    if mutates {
        persistence::save(db.store(), &db_path)
            .await
            .with_context(|| format!("Failed to save snapshot {}", db_path.display()))?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<RefDbError>() {
            Some(RefDbError::UnknownId { .. }) => {
                eprintln!("{} {}", "Not found:".yellow().bold(), e)
            }
            _ => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}
