//! Cross-checks entity fields that point at other entities.
//!
//! Any string value shaped like a reference to a registered schema must
//! resolve. Strings naming unknown schemas are ordinary text and are left
//! alone, so prose containing `::` does not trip the audit.

use crate::catalog::{EntityRegistry, REFERENCE_SEPARATOR};
use serde_json::Value;

/// Report every reference that parses but does not resolve.
pub fn find_dangling_references(registry: &EntityRegistry) -> Vec<String> {
    // Collect rather than short-circuit so one pass shows every broken link.
    let mut errors = Vec::new();
    for schema in registry.schemas() {
        for entity in &schema.records {
            let owner = format!("{}{REFERENCE_SEPARATOR}{}", schema.id, entity.id);
            for (field, value) in &entity.fields {
                walk(registry, &owner, field, value, &mut errors);
            }
        }
    }
    errors
}

fn walk(registry: &EntityRegistry, owner: &str, path: &str, value: &Value, errors: &mut Vec<String>) {
    match value {
        Value::String(text) => {
            if !text.contains(REFERENCE_SEPARATOR) {
                return;
            }
            let Ok(reference) = registry.parse_ref(text) else {
                return;
            };
            if !registry.exists(reference.schema.as_str(), reference.id.as_str()) {
                errors.push(format!(
                    "{owner} field {path} references missing entity '{text}'"
                ));
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                walk(registry, owner, &format!("{path}[{idx}]"), item, errors);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                walk(registry, owner, &format!("{path}.{key}"), item, errors);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Entity, SchemaDescriptor};
    use serde_json::json;

    #[test]
    fn reports_only_unresolved_known_schema_refs() {
        let registry = EntityRegistry::new(Catalog::new(vec![
            SchemaDescriptor::new(
                "systems",
                "Systems",
                vec![
                    Entity::from_value(json!({
                        "id": "s1",
                        "name": "Railgun",
                        "requires": ["modules::m1", "modules::gone"],
                        "upgrade": {"into": "systems::s9"},
                        "description": "Legacy::Text and ghosts::nothing are prose"
                    }))
                    .unwrap(),
                ],
            ),
            SchemaDescriptor::new(
                "modules",
                "Modules",
                vec![Entity::from_value(json!({"id": "m1", "name": "Capacitor"})).unwrap()],
            ),
        ]))
        .unwrap();

        let errors = find_dangling_references(&registry);
        assert_eq!(
            errors,
            vec![
                "systems::s1 field requires[1] references missing entity 'modules::gone'",
                "systems::s1 field upgrade.into references missing entity 'systems::s9'",
            ]
        );
    }
}
