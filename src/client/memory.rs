// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory search client.
//!
//! Stores documents per index and evaluates the DSL subset this crate emits
//! for conditions:
//!
//! ```text
//! match_all, term, terms, range, exists, bool   - query / post_filter
//! terms                                         - aggregations
//! sort, from, size, _source                     - paging & projection
//! ```
//!
//! Anything else (nested, script, raw constructs) fails with
//! [`ClientError::Unsupported`]. Every request body is recorded so callers
//! can assert on round trips.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::traits::{ClientError, DeleteByQueryResponse, RawHit, RawResponse, SearchClient};
use crate::search::SearchBody;

type Source = Map<String, Value>;

/// Default page size applied by the engine when `size` is absent
const ENGINE_DEFAULT_SIZE: usize = 10;

/// A request seen by the client
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub operation: &'static str,
    pub index: String,
    pub body: Value,
}

pub struct InMemoryClient {
    /// index → (id → source), ids sorted for deterministic hit order
    indexes: DashMap<String, BTreeMap<String, Source>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl InMemoryClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexes: DashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Store (or replace) a document. `source` must be a JSON object.
    pub fn index_document(&self, index: &str, id: &str, source: Value) -> Result<(), ClientError> {
        let Value::Object(source) = source else {
            return Err(ClientError::Request(format!(
                "document '{}' must be a JSON object",
                id
            )));
        };
        self.indexes
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source);
        Ok(())
    }

    /// Number of documents stored in `index`
    #[must_use]
    pub fn len(&self, index: &str) -> usize {
        self.indexes.get(index).map(|docs| docs.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self, index: &str) -> bool {
        self.len(index) == 0
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn record(&self, operation: &'static str, index: &str, body: &Value) {
        self.requests.lock().push(RecordedRequest {
            operation,
            index: index.to_string(),
            body: body.clone(),
        });
    }

    fn snapshot(&self, index: &str) -> Vec<(String, Source)> {
        self.indexes
            .get(index)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn render(body: &SearchBody) -> Result<Value, ClientError> {
        serde_json::to_value(body).map_err(|e| ClientError::Request(e.to_string()))
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchClient for InMemoryClient {
    async fn execute(&self, index: &str, body: &SearchBody) -> Result<RawResponse, ClientError> {
        let request = Self::render(body)?;
        self.record("search", index, &request);
        debug!(index = %index, body = %request, "In-memory search");

        let match_all = json!({ "match_all": {} });
        let query = request.get("query").unwrap_or(&match_all);

        let mut matched = Vec::new();
        for (id, source) in self.snapshot(index) {
            if matches(query, &source)? {
                matched.push((id, source));
            }
        }

        // Aggregations see everything the main query matched
        let aggregations = match request.get("aggregations") {
            Some(Value::Object(aggs)) => aggregate(aggs, &matched)?,
            _ => Map::new(),
        };

        if let Some(post_filter) = request.get("post_filter") {
            let mut kept = Vec::with_capacity(matched.len());
            for (id, source) in matched {
                if matches(post_filter, &source)? {
                    kept.push((id, source));
                }
            }
            matched = kept;
        }

        if let Some(Value::Array(sort)) = request.get("sort") {
            sort_hits(&mut matched, sort)?;
        }

        let total = matched.len() as u64;
        let from = request.get("from").and_then(Value::as_u64).unwrap_or(0);
        let size = request
            .get("size")
            .and_then(Value::as_u64)
            .unwrap_or(ENGINE_DEFAULT_SIZE as u64);

        let hits: Vec<RawHit> = matched
            .into_iter()
            .skip(usize::try_from(from).unwrap_or(usize::MAX))
            .take(usize::try_from(size).unwrap_or(usize::MAX))
            .map(|(id, source)| RawHit {
                id,
                data: project(source, request.get("_source")),
                score: Some(1.0),
                highlight: None,
            })
            .collect();

        Ok(RawResponse {
            max_score: (!hits.is_empty()).then_some(1.0),
            hits,
            total,
            aggregations,
            suggestions: Map::new(),
            took: 0,
            timed_out: false,
        })
    }

    async fn delete_by_query(
        &self,
        index: &str,
        body: &SearchBody,
    ) -> Result<DeleteByQueryResponse, ClientError> {
        let request = Self::render(body)?;
        self.record("delete_by_query", index, &request);

        let match_all = json!({ "match_all": {} });
        let query = request.get("query").unwrap_or(&match_all);

        let mut doomed = Vec::new();
        for (id, source) in self.snapshot(index) {
            if matches(query, &source)? {
                doomed.push(id);
            }
        }

        if let Some(mut docs) = self.indexes.get_mut(index) {
            for id in &doomed {
                docs.remove(id);
            }
        }
        debug!(index = %index, deleted = doomed.len(), "In-memory delete by query");

        Ok(DeleteByQueryResponse {
            ok: true,
            deleted: doomed.len() as u64,
        })
    }

    async fn refresh(&self, index: &str) -> Result<(), ClientError> {
        self.record("refresh", index, &Value::Null);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DSL evaluation
// ═══════════════════════════════════════════════════════════════════════════

fn single_entry<'a>(value: &'a Value, context: &str) -> Result<(&'a str, &'a Value), ClientError> {
    match value.as_object() {
        Some(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ClientError::Request(format!("empty {} clause", context))),
        _ => Err(ClientError::Request(format!(
            "{} clause must be an object with one key: {}",
            context, value
        ))),
    }
}

fn lookup<'a>(source: &'a Source, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = source.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal) || left == right
}

/// Field values, flattening arrays the way the engine indexes them
fn values_of<'a>(source: &'a Source, field: &str) -> Vec<&'a Value> {
    match lookup(source, field) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![value],
    }
}

fn all_match(clauses: Option<&Value>, source: &Source) -> Result<bool, ClientError> {
    for clause in clauses.and_then(Value::as_array).into_iter().flatten() {
        if !matches(clause, source)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches(query: &Value, source: &Source) -> Result<bool, ClientError> {
    let (kind, body) = single_entry(query, "query")?;
    match kind {
        "match_all" => Ok(true),
        "term" => {
            let (field, expected) = single_entry(body, "term")?;
            Ok(values_of(source, field).into_iter().any(|v| equals(v, expected)))
        }
        "terms" => {
            let (field, expected) = single_entry(body, "terms")?;
            let expected = expected
                .as_array()
                .ok_or_else(|| ClientError::Request("terms expects an array".into()))?;
            Ok(values_of(source, field)
                .into_iter()
                .any(|v| expected.iter().any(|e| equals(v, e))))
        }
        "range" => {
            let (field, bounds) = single_entry(body, "range")?;
            let bounds = bounds
                .as_object()
                .ok_or_else(|| ClientError::Request("range expects bounds".into()))?;
            Ok(values_of(source, field).into_iter().any(|v| {
                bounds.iter().all(|(op, bound)| match (op.as_str(), compare(v, bound)) {
                    ("gt", Some(o)) => o == Ordering::Greater,
                    ("gte", Some(o)) => o != Ordering::Less,
                    ("lt", Some(o)) => o == Ordering::Less,
                    ("lte", Some(o)) => o != Ordering::Greater,
                    _ => false,
                })
            }))
        }
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| ClientError::Request("exists expects a field".into()))?;
            Ok(!values_of(source, field).is_empty())
        }
        "bool" => {
            if !all_match(body.get("must"), source)? || !all_match(body.get("filter"), source)? {
                return Ok(false);
            }
            for clause in body.get("must_not").and_then(Value::as_array).into_iter().flatten() {
                if matches(clause, source)? {
                    return Ok(false);
                }
            }
            let should = body.get("should").and_then(Value::as_array);
            let required = body.get("must").is_none() && body.get("filter").is_none();
            match should {
                Some(clauses) if required && !clauses.is_empty() => {
                    for clause in clauses {
                        if matches(clause, source)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                _ => Ok(true),
            }
        }
        other => Err(ClientError::Unsupported(other.to_string())),
    }
}

fn aggregate(
    aggs: &Map<String, Value>,
    matched: &[(String, Source)],
) -> Result<Map<String, Value>, ClientError> {
    let mut out = Map::new();
    for (name, body) in aggs {
        let (kind, params) = single_entry(body, "aggregation")?;
        if kind != "terms" {
            return Err(ClientError::Unsupported(format!("{} aggregation", kind)));
        }
        let field = params
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Request("terms aggregation expects a field".into()))?;
        let size = params
            .get("size")
            .and_then(Value::as_u64)
            .unwrap_or(ENGINE_DEFAULT_SIZE as u64) as usize;

        let mut buckets: Vec<(Value, u64)> = Vec::new();
        for (_, source) in matched {
            for value in values_of(source, field) {
                match buckets.iter_mut().find(|(key, _)| equals(key, value)) {
                    Some((_, count)) => *count += 1,
                    None => buckets.push((value.clone(), 1)),
                }
            }
        }
        // Stable: ties keep first-seen order
        buckets.sort_by(|a, b| b.1.cmp(&a.1));
        let buckets: Vec<Value> = buckets
            .into_iter()
            .take(size)
            .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
            .collect();
        out.insert(name.clone(), json!({ "buckets": buckets }));
    }
    Ok(out)
}

fn sort_hits(matched: &mut [(String, Source)], sort: &[Value]) -> Result<(), ClientError> {
    let mut keys = Vec::with_capacity(sort.len());
    for spec in sort {
        let (field, options) = single_entry(spec, "sort")?;
        let descending = options.get("order").and_then(Value::as_str) == Some("desc");
        keys.push((field.to_string(), descending));
    }

    matched.sort_by(|(_, a), (_, b)| {
        for (field, descending) in &keys {
            let ordering = match (lookup(a, field), lookup(b, field)) {
                (Some(x), Some(y)) => {
                    let o = compare(x, y).unwrap_or(Ordering::Equal);
                    if *descending {
                        o.reverse()
                    } else {
                        o
                    }
                }
                // Missing values sort last either way
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// Apply `_source`: absent keeps everything, `false` drops the body, a field
/// list keeps top-level keys named directly or as the prefix of a dotted path.
fn project(source: Source, selection: Option<&Value>) -> Source {
    match selection {
        Some(Value::Bool(false)) => Map::new(),
        Some(Value::Array(fields)) => {
            let fields: Vec<&str> = fields.iter().filter_map(Value::as_str).collect();
            source
                .into_iter()
                .filter(|(key, _)| {
                    fields.iter().any(|f| {
                        *f == key.as_str()
                            || f.strip_prefix(key.as_str())
                                .is_some_and(|rest| rest.starts_with('.'))
                    })
                })
                .collect()
        }
        _ => source,
    }
}
