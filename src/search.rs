//! Free-text search across registered schemas.
//!
//! Matching is plain substring containment against `name`, `description`,
//! and `effect`, optionally case-insensitive. Scores favor name matches:
//!
//! | condition                        | points |
//! |----------------------------------|--------|
//! | name equals query                | 100    |
//! | name starts with query           | 50     |
//! | name contains query              | 25     |
//! | description contains query       | +10    |
//! | per matched field                | +5     |
//!
//! Results are sorted by score, highest first; ties keep catalog order then
//! collection order.

use crate::catalog::{Entity, EntityId, EntityRegistry, Record, SchemaDescriptor, SchemaId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Cap applied by [`SearchEngine::suggestions`] when the request has none.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

const EXACT_NAME_SCORE: u32 = 100;
const PREFIX_NAME_SCORE: u32 = 50;
const CONTAINS_NAME_SCORE: u32 = 25;
const DESCRIPTION_BONUS: u32 = 10;
const PER_FIELD_BONUS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Name,
    Description,
    Effect,
}

impl MatchedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedField::Name => "name",
            MatchedField::Description => "description",
            MatchedField::Effect => "effect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// How `limit` interacts with the scan.
pub enum LimitMode {
    /// Scan everything, sort, then keep the best `limit` results.
    #[default]
    Truncate,
    /// Stop scanning once `limit` results are collected, then sort them.
    /// Cheaper, but higher-scoring entities later in catalog order are lost.
    EarlyExit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    /// Restrict to these schemas; unknown ids are ignored. `None` searches all.
    #[serde(default)]
    pub schemas: Option<Vec<SchemaId>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub limit_mode: LimitMode,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn in_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = Some(schemas.into_iter().map(|s| SchemaId(s.into())).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn limit_mode(mut self, mode: LimitMode) -> Self {
        self.limit_mode = mode;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<'a> {
    pub schema_id: &'a SchemaId,
    pub schema_title: &'a str,
    pub entity: &'a Entity,
    pub entity_id: &'a EntityId,
    pub entity_name: &'a str,
    pub matched_fields: Vec<MatchedField>,
    pub match_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of matching one record against a query.
pub struct RecordMatch {
    pub fields: Vec<MatchedField>,
    pub score: u32,
}

/// Match a record against a query; `None` when no field contains it.
///
/// `query` is matched as given; it must not be empty.
pub fn match_record<R: Record + ?Sized>(
    record: &R,
    query: &str,
    case_sensitive: bool,
) -> Option<RecordMatch> {
    let query_text = normalize(query, case_sensitive);
    let query: &str = &query_text;
    let name_text = normalize(record.name(), case_sensitive);
    let name: &str = &name_text;
    let description = record
        .description()
        .map(|text| normalize(text, case_sensitive));
    let effect = record.effect().map(|text| normalize(text, case_sensitive));

    let mut fields = Vec::new();
    if name.contains(query) {
        fields.push(MatchedField::Name);
    }
    let description_matched = description
        .as_deref()
        .is_some_and(|text| text.contains(query));
    if description_matched {
        fields.push(MatchedField::Description);
    }
    if effect.as_deref().is_some_and(|text| text.contains(query)) {
        fields.push(MatchedField::Effect);
    }
    if fields.is_empty() {
        return None;
    }

    let mut score = if name == query {
        EXACT_NAME_SCORE
    } else if name.starts_with(query) {
        PREFIX_NAME_SCORE
    } else if name.contains(query) {
        CONTAINS_NAME_SCORE
    } else {
        0
    };
    if description_matched {
        score += DESCRIPTION_BONUS;
    }
    score += PER_FIELD_BONUS * fields.len() as u32;

    Some(RecordMatch { fields, score })
}

fn normalize(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

/// Search front end over a registry.
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine<'r> {
    registry: &'r EntityRegistry,
}

impl<'r> SearchEngine<'r> {
    pub fn new(registry: &'r EntityRegistry) -> Self {
        Self { registry }
    }

    /// Run a search. Blank queries and a zero limit return nothing.
    ///
    /// Surrounding whitespace only decides blankness; a non-blank query is
    /// matched verbatim.
    pub fn search(&self, request: &SearchRequest) -> Vec<SearchResult<'r>> {
        let query = request.query.as_str();
        if query.trim().is_empty() || request.limit == Some(0) {
            return Vec::new();
        }

        let mut results = Vec::new();
        'schemas: for schema in self.target_schemas(request) {
            for entity in &schema.records {
                let Some(found) = match_record(entity, query, request.case_sensitive) else {
                    continue;
                };
                results.push(SearchResult {
                    schema_id: &schema.id,
                    schema_title: &schema.title,
                    entity,
                    entity_id: &entity.id,
                    entity_name: &entity.name,
                    matched_fields: found.fields,
                    match_score: found.score,
                });
                if request.limit_mode == LimitMode::EarlyExit
                    && request.limit.is_some_and(|limit| results.len() >= limit)
                {
                    break 'schemas;
                }
            }
        }

        // sort_by is stable, so equal scores stay in scan order
        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        if let Some(limit) = request.limit {
            results.truncate(limit);
        }
        debug!(query, results = results.len(), "search complete");
        results
    }

    /// Search one schema and return only the matching entities, best first.
    pub fn search_in(&self, schema_id: &str, request: &SearchRequest) -> Vec<&'r Entity> {
        let scoped = SearchRequest {
            schemas: Some(vec![SchemaId(schema_id.to_string())]),
            ..request.clone()
        };
        self.search(&scoped)
            .into_iter()
            .map(|result| result.entity)
            .collect()
    }

    /// Distinct entity names from the top results, in result order.
    pub fn suggestions(&self, request: &SearchRequest) -> Vec<&'r str> {
        let limited = SearchRequest {
            limit: Some(request.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT)),
            ..request.clone()
        };
        let mut seen = HashSet::new();
        self.search(&limited)
            .into_iter()
            .map(|result| result.entity_name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    fn target_schemas(&self, request: &SearchRequest) -> Vec<&'r SchemaDescriptor> {
        let registry: &'r EntityRegistry = self.registry;
        match &request.schemas {
            None => registry.schemas().collect(),
            Some(wanted) => {
                for unknown in wanted.iter().filter(|id| !registry.has_schema(id.as_str())) {
                    warn!(schema = %unknown, "ignoring unknown schema in search restriction");
                }
                registry
                    .schemas()
                    .filter(|schema| wanted.contains(&schema.id))
                    .collect()
            }
        }
    }
}
