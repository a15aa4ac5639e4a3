//! Uniform read-only queries over one schema's records.
//!
//! `RecordModel` borrows the backing slice; it never copies or reorders it.
//! Every query scans in collection order, so "first" always means first in
//! load order. Predicates are expected to be pure with respect to the record.

use crate::catalog::model::{Entity, Record};
use serde_json::Value;

#[derive(Debug)]
pub struct RecordModel<'a, R = Entity> {
    records: &'a [R],
}

impl<R> Clone for RecordModel<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RecordModel<'_, R> {}

impl<'a, R: Record> RecordModel<'a, R> {
    pub fn new(records: &'a [R]) -> Self {
        Self { records }
    }

    /// The full backing collection, in load order.
    pub fn all(&self) -> &'a [R] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find<P>(&self, predicate: P) -> Option<&'a R>
    where
        P: Fn(&R) -> bool,
    {
        self.records.iter().find(|record| predicate(*record))
    }

    /// Position of the first match; lets callers cache a cheap handle.
    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&R) -> bool,
    {
        self.records.iter().position(predicate)
    }

    pub fn find_all<P>(&self, predicate: P) -> Vec<&'a R>
    where
        P: Fn(&R) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(*record))
            .collect()
    }

    pub fn by_id(&self, id: &str) -> Option<&'a R> {
        self.find(|record| record.id() == id)
    }

    pub fn by_name(&self, name: &str) -> Vec<&'a R> {
        self.find_all(|record| record.name() == name)
    }
}

impl<'a> RecordModel<'a, Entity> {
    /// Records whose numeric `techLevel` equals `level`.
    pub fn by_tech_level(&self, level: i64) -> Vec<&'a Entity> {
        self.find_all(|entity| {
            entity
                .field("techLevel")
                .and_then(Value::as_i64)
                .is_some_and(|value| value == level)
        })
    }

    /// Records whose numeric `field` is at least `min`; non-numeric values never match.
    pub fn with_minimum(&self, field: &str, min: f64) -> Vec<&'a Entity> {
        self.find_all(|entity| entity.number(field).is_some_and(|value| value >= min))
    }

    /// Records whose `field` equals `value` exactly (JSON equality).
    pub fn by_field(&self, field: &str, value: &Value) -> Vec<&'a Entity> {
        self.find_all(|entity| entity.field(field) == Some(value))
    }

    /// Records carrying the named trait.
    ///
    /// A `traits` entry is either a bare string or an object whose `type` or
    /// `name` holds the trait; comparison ignores case.
    pub fn with_trait(&self, trait_name: &str) -> Vec<&'a Entity> {
        self.find_all(|entity| has_trait(entity, trait_name))
    }
}

fn has_trait(entity: &Entity, trait_name: &str) -> bool {
    let Some(traits) = entity.field("traits").and_then(Value::as_array) else {
        return false;
    };
    traits.iter().any(|entry| {
        let label = match entry {
            Value::String(label) => Some(label.as_str()),
            Value::Object(map) => map
                .get("type")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str),
            _ => None,
        };
        label.is_some_and(|label| label.eq_ignore_ascii_case(trait_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Entity> {
        [
            json!({"id": "s1", "name": "Railgun", "techLevel": 4, "slots": 2,
                   "traits": ["Hot", {"type": "Ballistic", "amount": 2}]}),
            json!({"id": "s2", "name": "Winch", "techLevel": 1, "slots": 1}),
            json!({"id": "s3", "name": "Railgun", "techLevel": 4, "slots": "many",
                   "traits": [{"name": "hot"}]}),
        ]
        .into_iter()
        .map(|value| Entity::from_value(value).unwrap())
        .collect()
    }

    #[test]
    fn find_returns_first_in_collection_order() {
        let data = records();
        let model = RecordModel::new(&data);
        let hit = model.find(|e| e.name == "Railgun").unwrap();
        assert_eq!(hit.id.as_str(), "s1");
        assert!(model.find(|e| e.name == "Cannon").is_none());
        assert_eq!(model.position(|e| e.id.as_str() == "s3"), Some(2));
    }

    #[test]
    fn find_all_preserves_order_and_allows_empty() {
        let data = records();
        let model = RecordModel::new(&data);
        let ids: Vec<&str> = model
            .find_all(|e| e.name == "Railgun")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert!(model.find_all(|_| false).is_empty());
        assert_eq!(model.all().len(), 3);
    }

    #[test]
    fn convenience_filters_are_predicates() {
        let data = records();
        let model = RecordModel::new(&data);
        assert_eq!(model.by_tech_level(4).len(), 2);
        assert_eq!(model.by_tech_level(9).len(), 0);

        let roomy = model.with_minimum("slots", 2.0);
        assert_eq!(roomy.len(), 1);
        assert_eq!(roomy[0].id.as_str(), "s1");

        assert_eq!(model.by_field("slots", &json!(1))[0].id.as_str(), "s2");
        assert_eq!(model.by_id("s2").map(|e| e.name.as_str()), Some("Winch"));
        assert_eq!(model.by_name("Railgun").len(), 2);
    }

    #[test]
    fn with_trait_accepts_strings_and_objects() {
        let data = records();
        let model = RecordModel::new(&data);
        let hot: Vec<&str> = model
            .with_trait("HOT")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(hot, vec!["s1", "s3"]);
        assert_eq!(model.with_trait("ballistic").len(), 1);
        assert!(model.with_trait("Cold").is_empty());
    }
}
