//! Shared library for the gearbook data tools.
//!
//! The crate exposes the catalog types, the cross-schema registry, search,
//! and the table-roll resolver. Public functions here form the contract the
//! `gearbook` binary and the viewer depend on: data directory discovery,
//! validated loading, and list parsing for command-line options.

use anyhow::{Context, Result, bail};
use std::{
    env,
    path::{Path, PathBuf},
};

pub mod catalog;
pub mod error;
pub mod reference_validation;
pub mod search;
pub mod table;

pub use catalog::{
    Catalog, Entity, EntityId, EntityRef, EntityRegistry, Record, RecordModel, SchemaDescriptor,
    SchemaId, compose_ref, load_catalog_from_dir, load_validated_catalog,
};
pub use error::RegistryError;
pub use reference_validation::find_dangling_references;
pub use search::{LimitMode, MatchedField, SearchEngine, SearchRequest, SearchResult};
pub use table::{RollError, RollTable, TableShape, TableType, resolve_roll, roll_d20, roll_on};

/// Environment variable naming the data directory.
pub const DATA_ROOT_ENV: &str = "GEARBOOK_DATA_ROOT";
const DATA_DIR: &str = "data";

/// Returns true when `candidate` holds a catalog manifest.
fn is_data_root(candidate: &Path) -> bool {
    candidate.join(catalog::CATALOG_MANIFEST).is_file()
}

fn data_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_data_root(&hint_path) {
        return None;
    }
    hint_path.canonicalize().ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = start.canonicalize().ok()?;
    loop {
        let candidate = dir.join(DATA_DIR);
        if is_data_root(&candidate) {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the data directory.
///
/// Search order: an explicit override, `GEARBOOK_DATA_ROOT` if it points at
/// a catalog, a `data/` directory above the current directory, then the
/// crate's own `data/` recorded at build time.
pub fn find_data_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !is_data_root(path) {
            bail!(
                "no {} under {}",
                catalog::CATALOG_MANIFEST,
                path.display()
            );
        }
        return path
            .canonicalize()
            .with_context(|| format!("canonicalizing {}", path.display()));
    }

    if let Ok(env_root) = env::var(DATA_ROOT_ENV) {
        if let Some(root) = data_root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd) {
            return Ok(root);
        }
    }

    if let Some(hint) = option_env!("GEARBOOK_DATA_ROOT_HINT") {
        if let Some(root) = data_root_from_hint(hint) {
            return Ok(root);
        }
    }

    bail!("Unable to locate a gearbook data directory. Set {DATA_ROOT_ENV} or pass --data.");
}

/// Load and validate a data directory, then build the registry over it.
pub fn load_registry(data_dir: &Path) -> Result<EntityRegistry> {
    let catalog = load_validated_catalog(data_dir)?;
    EntityRegistry::new(catalog)
        .with_context(|| format!("registering catalog from {}", data_dir.display()))
}

/// Split comma- or whitespace-delimited lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
