use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between the schema and entity halves of a reference string.
pub const REFERENCE_SEPARATOR: &str = "::";

/// Stable identifier for a schema (entity collection), e.g. `systems`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(pub String);

/// Identifier of a single entity, unique within its schema.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl SchemaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SchemaId {
    fn from(value: &str) -> Self {
        SchemaId(value.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

impl Borrow<str> for SchemaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Global pointer to one entity: `<schema>::<id>`.
///
/// Construction does not check that the schema is registered; use
/// [`EntityRegistry::parse_ref`](crate::EntityRegistry::parse_ref) for input
/// that must name a known schema. Neither half is escaped, so an id that
/// itself contains `::` cannot round-trip.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EntityRef {
    pub schema: SchemaId,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(schema: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            schema: SchemaId(schema.into()),
            id: EntityId(id.into()),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{REFERENCE_SEPARATOR}{}", self.schema, self.id)
    }
}

impl Serialize for EntityRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Join a schema id and entity id into a reference string.
pub fn compose_ref(schema: &str, id: &str) -> String {
    format!("{schema}{REFERENCE_SEPARATOR}{id}")
}

/// Split a reference into its two halves.
///
/// Returns `None` unless splitting on `::` yields exactly two non-empty parts.
pub(crate) fn split_ref(reference: &str) -> Option<(&str, &str)> {
    let mut parts = reference.split(REFERENCE_SEPARATOR);
    let schema = parts.next()?;
    let id = parts.next()?;
    if parts.next().is_some() || schema.is_empty() || id.is_empty() {
        return None;
    }
    Some((schema, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_matches_display() {
        let reference = EntityRef::new("systems", "railgun");
        assert_eq!(reference.to_string(), "systems::railgun");
        assert_eq!(compose_ref("systems", "railgun"), reference.to_string());
    }

    #[test]
    fn split_requires_exactly_two_non_empty_parts() {
        assert_eq!(split_ref("systems::a1"), Some(("systems", "a1")));
        assert_eq!(split_ref("systems"), None);
        assert_eq!(split_ref("systems::"), None);
        assert_eq!(split_ref("::a1"), None);
        assert_eq!(split_ref("a::b::c"), None);
        // single colons are part of the id
        assert_eq!(split_ref("systems:a::b"), Some(("systems:a", "b")));
    }

    #[test]
    fn identifiers_serialize_transparently() {
        let id = SchemaId::from("classes.core");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"classes.core\"");
        let parsed: EntityId = serde_json::from_str("\"hauler\"").unwrap();
        assert_eq!(parsed, EntityId::from("hauler"));

        let reference = EntityRef::new("abilities", "scan");
        assert_eq!(
            serde_json::to_string(&reference).unwrap(),
            "\"abilities::scan\""
        );
    }
}
