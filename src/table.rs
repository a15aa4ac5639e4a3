//! d20 roll tables.
//!
//! A table is a JSON object whose keys are single faces (`"7"`) or inclusive
//! ranges (`"2-5"`), each mapping to an outcome string, plus an
//! informational `type`. The lookup strategy is chosen from the key layout,
//! never from `type`: twenty single-face keys form a flat table, anything
//! else is a range table.

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

pub const MIN_ROLL: i64 = 1;
pub const MAX_ROLL: i64 = 20;

const FLAT_TABLE_FACES: usize = 20;

static ROLL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:-(\d+))?$").expect("roll key pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("roll must be between 1 and 20, got {0}")]
    InvalidRoll(i64),

    #[error("no table provided")]
    MissingTable,

    #[error("no table entry matches roll {0}")]
    NoResult(i64),
}

/// Lookup strategy derived from the key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    Flat,
    Range,
}

/// Declared `type` of a table. Informational only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TableType {
    Standard,
    Alternate,
    Flat,
    Full,
    Other(String),
}

impl TableType {
    pub fn as_str(&self) -> &str {
        match self {
            TableType::Standard => "standard",
            TableType::Alternate => "alternate",
            TableType::Flat => "flat",
            TableType::Full => "full",
            TableType::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        match value {
            "standard" => TableType::Standard,
            "standard2" | "alternate" => TableType::Alternate,
            "flat" => TableType::Flat,
            "full" => TableType::Full,
            other => TableType::Other(other.to_string()),
        }
    }
}

impl Serialize for TableType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TableType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RollKey {
    Face(i64),
    Range(i64, i64),
}

fn parse_key(key: &str) -> Option<RollKey> {
    let captures = ROLL_KEY.captures(key)?;
    let low: i64 = captures.get(1)?.as_str().parse().ok()?;
    match captures.get(2) {
        Some(high) => Some(RollKey::Range(low, high.as_str().parse().ok()?)),
        None => Some(RollKey::Face(low)),
    }
}

/// Borrowed view of a table object.
#[derive(Debug, Clone, Copy)]
pub struct RollTable<'a> {
    entries: &'a Map<String, Value>,
}

impl<'a> RollTable<'a> {
    /// Wrap a table value; anything but a JSON object is not a table.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|entries| Self { entries })
    }

    pub fn kind(&self) -> Option<TableType> {
        self.entries
            .get("type")
            .and_then(Value::as_str)
            .map(TableType::from_str)
    }

    pub fn shape(&self) -> TableShape {
        let mut faces = 0;
        for key in self.entries.keys() {
            match parse_key(key) {
                Some(RollKey::Face(_)) => faces += 1,
                Some(RollKey::Range(..)) => return TableShape::Range,
                None => {}
            }
        }
        if faces == FLAT_TABLE_FACES {
            TableShape::Flat
        } else {
            TableShape::Range
        }
    }

    /// Resolve a roll. Overlapping ranges resolve to the first in key order.
    pub fn resolve(&self, roll: i64) -> Result<&'a str, RollError> {
        check_roll(roll)?;
        let exact = self.entries.get(&roll.to_string()).and_then(Value::as_str);
        if self.shape() == TableShape::Flat {
            return exact.ok_or(RollError::NoResult(roll));
        }
        if let Some(outcome) = exact {
            return Ok(outcome);
        }
        self.entries
            .iter()
            .find_map(|(key, outcome)| match parse_key(key)? {
                RollKey::Range(low, high) if (low..=high).contains(&roll) => outcome.as_str(),
                _ => None,
            })
            .ok_or(RollError::NoResult(roll))
    }
}

fn check_roll(roll: i64) -> Result<(), RollError> {
    if (MIN_ROLL..=MAX_ROLL).contains(&roll) {
        Ok(())
    } else {
        Err(RollError::InvalidRoll(roll))
    }
}

/// Resolve `roll` against an optional table value.
///
/// The roll is checked first; a missing or non-object table is `MissingTable`.
pub fn resolve_roll(table: Option<&Value>, roll: i64) -> Result<&str, RollError> {
    check_roll(roll)?;
    let table = table
        .and_then(RollTable::from_value)
        .ok_or(RollError::MissingTable)?;
    table.resolve(roll)
}

pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(MIN_ROLL..=MAX_ROLL)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollOutcome<'a> {
    pub roll: i64,
    pub result: &'a str,
}

/// Roll a d20 and resolve it against the table.
pub fn roll_on<'a, R: Rng + ?Sized>(
    table: Option<&'a Value>,
    rng: &mut R,
) -> Result<RollOutcome<'a>, RollError> {
    let roll = roll_d20(rng);
    let result = resolve_roll(table, roll)?;
    Ok(RollOutcome { roll, result })
}
