//! Command-line front end for the game data catalog.
//!
//! Loads the validated catalog once, then answers one query per invocation:
//! schema listing, search, suggestions, reference lookups, table rolls, and
//! a consistency check. Results go to stdout as JSON (NDJSON for result
//! lists); diagnostics and logs go to stderr.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use gearbook::search::SearchEngine;
use gearbook::{
    EntityRegistry, LimitMode, SearchRequest, find_dangling_references, find_data_root,
    load_registry, resolve_roll, roll_on, split_list,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GEARBOOK_LOG";

#[derive(Parser)]
#[command(name = "gearbook")]
#[command(about = "Query and search the game data catalog", long_about = None)]
struct Cli {
    /// Data directory containing catalog.json (or set GEARBOOK_DATA_ROOT).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List schemas in catalog order
    Schemas,
    /// Search names, descriptions, and effects
    Search {
        query: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Stop scanning once the limit is reached instead of ranking everything
        #[arg(long)]
        early_exit: bool,
    },
    /// Suggest entity names for a partial query
    Suggest {
        query: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Resolve one or more `schema::id` references
    Get {
        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// Resolve a d20 roll against an entity's table
    Roll {
        schema: String,
        id: String,
        /// Roll value; a random d20 is used when omitted
        #[arg(long)]
        roll: Option<i64>,
        /// Field holding the table
        #[arg(long, default_value = "table")]
        field: String,
    },
    /// Validate the catalog and its cross references
    Check,
}

#[derive(Args)]
struct FilterArgs {
    /// Comma-separated schema ids to restrict to
    #[arg(long)]
    schemas: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    case_sensitive: bool,
}

impl FilterArgs {
    fn request(&self, query: &str) -> SearchRequest {
        let mut request = SearchRequest::new(query).case_sensitive(self.case_sensitive);
        if let Some(raw) = &self.schemas {
            request = request.in_schemas(split_list(raw));
        }
        if let Some(limit) = self.limit {
            request = request.limit(limit);
        }
        request
    }
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = find_data_root(cli.data.as_deref())?;
    debug!(dir = %data_dir.display(), "using data directory");
    let registry = load_registry(&data_dir)?;

    match cli.command {
        Commands::Schemas => {
            for schema in registry.schemas() {
                print_json(&json!({
                    "id": schema.id,
                    "title": schema.title,
                    "records": schema.records.len(),
                }))?;
            }
        }
        Commands::Search {
            query,
            filter,
            early_exit,
        } => {
            let mut request = filter.request(&query);
            if early_exit {
                request = request.limit_mode(LimitMode::EarlyExit);
            }
            for result in SearchEngine::new(&registry).search(&request) {
                print_json(&result)?;
            }
        }
        Commands::Suggest { query, filter } => {
            let names = SearchEngine::new(&registry).suggestions(&filter.request(&query));
            print_json(&names)?;
        }
        Commands::Get { refs } => {
            print_json(&registry.get_many_by_ref(&refs))?;
        }
        Commands::Roll {
            schema,
            id,
            roll,
            field,
        } => roll_command(&registry, &schema, &id, roll, &field)?,
        Commands::Check => {
            let problems = find_dangling_references(&registry);
            if !problems.is_empty() {
                bail!(
                    "{} dangling reference(s):\n{}",
                    problems.len(),
                    problems.join("\n")
                );
            }
            eprintln!("gearbook: catalog at {} is consistent", data_dir.display());
        }
    }
    Ok(())
}

fn roll_command(
    registry: &EntityRegistry,
    schema: &str,
    id: &str,
    roll: Option<i64>,
    field: &str,
) -> Result<()> {
    let entity = registry
        .find_in(schema, |e| e.id.as_str() == id)?
        .with_context(|| format!("no entity {}", registry.compose_ref(schema, id)))?;
    let table: Option<&Value> = entity.field(field);
    let outcome = match roll {
        Some(roll) => resolve_roll(table, roll).map(|result| json!({"roll": roll, "result": result})),
        None => roll_on(table, &mut rand::thread_rng()).map(|outcome| json!(outcome)),
    }
    .with_context(|| format!("rolling on {schema}::{id} field '{field}'"))?;
    print_json(&outcome)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
