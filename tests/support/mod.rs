#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use gearbook::{Catalog, Entity, EntityRegistry, SchemaDescriptor};
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};

/// The demo catalog shipped with the crate.
pub fn shipped_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

pub fn gearbook_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gearbook"))
}

pub fn entity(value: Value) -> Entity {
    Entity::from_value(value).expect("fixture entity must have id and name")
}

/// Build a registry from `(schema id, title, records)` triples, in order.
pub fn registry_from(schemas: Vec<(&str, &str, Vec<Value>)>) -> EntityRegistry {
    let descriptors = schemas
        .into_iter()
        .map(|(id, title, records)| {
            SchemaDescriptor::new(id, title, records.into_iter().map(entity).collect())
        })
        .collect();
    EntityRegistry::new(Catalog::new(descriptors)).expect("fixture schemas must be unique")
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Parse NDJSON stdout into values.
pub fn parse_ndjson(stdout: &[u8]) -> Result<Vec<Value>> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).with_context(|| format!("bad JSON line: {line}")))
        .collect()
}
