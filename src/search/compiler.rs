// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Compiler
//!
//! Accumulates independently-set clauses and assembles them into one
//! search request body on demand.
//!
//! # Example
//!
//! ```rust
//! use search_odm::search::{QueryCompiler, SortSpec};
//! use serde_json::json;
//!
//! let compiler = QueryCompiler::new()
//!     .select(["name", "age"])
//!     .where_(json!({"name": "mark", "age <=": 35})).unwrap()
//!     .order(SortSpec::desc("age"))
//!     .page(2, Some(10));
//!
//! let body = compiler.compile();
//! assert_eq!(body.size, Some(10));
//! assert_eq!(body.from, Some(10));
//! ```
//!
//! # Filter vs post filter
//!
//! `where_` conditions end up under `query.bool.filter`: they restrict hits
//! and aggregations without affecting score. `post_filter` conditions become
//! a top-level `post_filter` that narrows returned hits only *after*
//! aggregations were bucketed.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::condition::{Condition, ConditionParser};
use super::query_node::{BoolQuery, QueryNode};
use crate::error::OdmError;

/// Page size used by [`QueryCompiler::page`] when no limit was ever set
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(OdmError::InvalidCondition(format!(
                "unknown sort order '{}'",
                other
            ))),
        }
    }
}

/// One sort entry: {field: {"order": "asc", ..options}}
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
    /// Extra sort options (`mode`, `missing`, `unmapped_type`, ...)
    pub options: Map<String, Value>,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
            options: Map::new(),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// Attach an extra sort option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("order".into(), Value::String(self.order.to_string()));
        for (k, v) in &self.options {
            body.insert(k.clone(), v.clone());
        }
        json!({ self.field.as_str(): body })
    }
}

impl From<&str> for SortSpec {
    fn from(field: &str) -> Self {
        SortSpec::asc(field)
    }
}

impl From<String> for SortSpec {
    fn from(field: String) -> Self {
        SortSpec::asc(field)
    }
}

impl<F: Into<String>> From<(F, SortOrder)> for SortSpec {
    fn from((field, order): (F, SortOrder)) -> Self {
        SortSpec::new(field, order)
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Named aggregation with its DSL body
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub body: Value,
}

impl Aggregation {
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// Bucket documents by the distinct values of `field`
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        let field: String = field.into();
        Self::new(name, json!({ "terms": { "field": field } }))
    }
}

/// `_source` clause: an include list, or `false` to skip document bodies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceSelection {
    Fields(Vec<String>),
    Enabled(bool),
}

/// Compiled search request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
    pub query: QueryNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_filter: Option<QueryNode>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub aggregations: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
}

impl SearchBody {
    /// Render the request body as JSON
    pub fn to_json(&self) -> Result<Value, OdmError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The mutable clause slots of a compiler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    pub fields: Vec<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub order: Vec<SortSpec>,
    pub highlight: Option<Value>,
    pub aggregations: Vec<Aggregation>,
    /// Scoring query
    pub query: Option<QueryNode>,
    /// Filter context, attached under the scoring Bool
    pub filter: Option<QueryNode>,
    /// Applied after aggregations
    pub post_filter: Option<QueryNode>,
    pub min_score: Option<f64>,
}

/// Clause slot names for introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Fields,
    Limit,
    Offset,
    Order,
    Highlight,
    Aggregations,
    Query,
    Filter,
    PostFilter,
    MinScore,
}

impl FromStr for Clause {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fields" => Ok(Clause::Fields),
            "limit" => Ok(Clause::Limit),
            "offset" => Ok(Clause::Offset),
            "order" => Ok(Clause::Order),
            "highlight" => Ok(Clause::Highlight),
            "aggregations" => Ok(Clause::Aggregations),
            "query" => Ok(Clause::Query),
            "filter" => Ok(Clause::Filter),
            "postFilter" | "post_filter" => Ok(Clause::PostFilter),
            "minScore" | "min_score" => Ok(Clause::MinScore),
            other => Err(OdmError::UnknownClause(other.to_string())),
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Query,
    Filter,
    PostFilter,
}

#[derive(Clone, Copy)]
enum Occur {
    Must,
    Should,
}

/// Builder for search request bodies
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCompiler {
    clauses: Clauses,
    default_page_size: usize,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCompiler {
    /// Create a compiler with an empty clause set
    pub fn new() -> Self {
        Self::with_default_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a compiler whose `page()` falls back to `size` when no limit is set
    pub fn with_default_page_size(size: usize) -> Self {
        Self {
            clauses: Clauses::default(),
            default_page_size: size,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Field selection & paging
    // ═══════════════════════════════════════════════════════════════════════

    /// Add fields to the source selection. Duplicates are ignored.
    pub fn select<F: Into<String>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        for field in fields {
            let field = field.into();
            if !self.clauses.fields.contains(&field) {
                self.clauses.fields.push(field);
            }
        }
        self
    }

    /// Replace the source selection
    pub fn overwrite_select<F: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = F>,
    ) -> Self {
        self.clauses.fields.clear();
        self.select(fields)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.clauses.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.clauses.offset = Some(offset);
        self
    }

    /// Set limit and offset for 1-based page `num`.
    ///
    /// Uses `limit` if given, else the stored limit, else the default page
    /// size. The offset saturates at `usize::MAX` instead of overflowing, and
    /// page 0 is treated as page 1.
    pub fn page(mut self, num: usize, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.clauses.limit = Some(limit);
        }
        let limit = self.clauses.limit.unwrap_or(self.default_page_size);
        self.clauses.limit = Some(limit);
        self.clauses.offset = Some(num.saturating_sub(1).saturating_mul(limit));
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sort, highlight, aggregations
    // ═══════════════════════════════════════════════════════════════════════

    /// Append a sort entry
    pub fn order(mut self, spec: impl Into<SortSpec>) -> Self {
        self.clauses.order.push(spec.into());
        self
    }

    /// Replace all sort entries with `spec`
    pub fn overwrite_order(mut self, spec: impl Into<SortSpec>) -> Self {
        self.clauses.order.clear();
        self.order(spec)
    }

    /// Set the highlight clause, attached verbatim
    pub fn highlight(mut self, spec: Value) -> Self {
        self.clauses.highlight = Some(spec);
        self
    }

    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.clauses.aggregations.push(aggregation);
        self
    }

    pub fn min_score(mut self, score: f64) -> Self {
        self.clauses.min_score = Some(score);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Conditions
    // ═══════════════════════════════════════════════════════════════════════

    /// AND conditions into the filter context.
    ///
    /// The compiler is consumed even when the condition is rejected. Parse
    /// untrusted input with [`ConditionParser::parse`] first and pass the
    /// resulting nodes here to keep the compiler on error.
    #[doc(alias = "where")]
    pub fn where_(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Filter, Occur::Must, condition.into(), false)
    }

    pub fn overwrite_where(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Filter, Occur::Must, condition.into(), true)
    }

    /// AND conditions into the scoring query.
    pub fn query_must(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Query, Occur::Must, condition.into(), false)
    }

    pub fn overwrite_query_must(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Query, Occur::Must, condition.into(), true)
    }

    /// OR conditions into the scoring query.
    pub fn query_should(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Query, Occur::Should, condition.into(), false)
    }

    pub fn overwrite_query_should(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::Query, Occur::Should, condition.into(), true)
    }

    /// AND conditions into the post filter.
    pub fn post_filter(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::PostFilter, Occur::Must, condition.into(), false)
    }

    pub fn overwrite_post_filter(self, condition: impl Into<Condition>) -> Result<Self, OdmError> {
        self.add_conditions(Slot::PostFilter, Occur::Must, condition.into(), true)
    }

    /// Replace the scoring query outright.
    ///
    /// A non-Bool query cannot carry the filter clause; see [`compile`](Self::compile).
    pub fn set_full_query(mut self, query: QueryNode) -> Self {
        self.clauses.query = Some(query);
        self
    }

    fn add_conditions(
        mut self,
        slot: Slot,
        occur: Occur,
        condition: Condition,
        overwrite: bool,
    ) -> Result<Self, OdmError> {
        let nodes = ConditionParser::parse(condition)?;

        let target = match slot {
            Slot::Query => &mut self.clauses.query,
            Slot::Filter => &mut self.clauses.filter,
            Slot::PostFilter => &mut self.clauses.post_filter,
        };
        let current = if overwrite { None } else { target.take() };
        let mut bool_query = match current {
            None => BoolQuery::new(),
            Some(QueryNode::Bool(existing)) => existing,
            // A full query set earlier becomes the first required clause
            Some(other) => BoolQuery {
                must: vec![other],
                ..Default::default()
            },
        };

        match occur {
            Occur::Must => bool_query.must.extend(nodes),
            Occur::Should => bool_query.should.extend(nodes),
        }
        *target = Some(QueryNode::Bool(bool_query));
        Ok(self)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════════════

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Current value of a clause slot as JSON, `None` when unset or empty.
    pub fn clause(&self, name: Clause) -> Option<Value> {
        let c = &self.clauses;
        match name {
            Clause::Fields => (!c.fields.is_empty()).then(|| json!(c.fields)),
            Clause::Limit => c.limit.map(|v| json!(v)),
            Clause::Offset => c.offset.map(|v| json!(v)),
            Clause::Order => (!c.order.is_empty())
                .then(|| Value::Array(c.order.iter().map(SortSpec::to_json).collect())),
            Clause::Highlight => c.highlight.clone(),
            Clause::Aggregations => (!c.aggregations.is_empty()).then(|| {
                Value::Object(
                    c.aggregations
                        .iter()
                        .map(|a| (a.name.clone(), a.body.clone()))
                        .collect(),
                )
            }),
            Clause::Query => c.query.as_ref().map(QueryNode::to_json),
            Clause::Filter => c.filter.as_ref().map(QueryNode::to_json),
            Clause::PostFilter => c.post_filter.as_ref().map(QueryNode::to_json),
            Clause::MinScore => c.min_score.map(|v| json!(v)),
        }
    }

    /// [`clause`](Self::clause) by slot name (`"postFilter"`, `"limit"`, ...)
    pub fn clause_named(&self, name: &str) -> Result<Option<Value>, OdmError> {
        Ok(self.clause(name.parse()?))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Compilation
    // ═══════════════════════════════════════════════════════════════════════

    /// Assemble the request body. Never mutates the clause set.
    ///
    /// The scoring query is the query slot or an empty (match-all) Bool. The
    /// filter slot is attached under the scoring query's `bool.filter`; if
    /// the scoring query was replaced by a non-Bool node the filter is **not**
    /// attached and a warning is logged.
    pub fn compile(&self) -> SearchBody {
        let c = &self.clauses;

        let source = (!c.fields.is_empty()).then(|| SourceSelection::Fields(c.fields.clone()));

        let mut query = c
            .query
            .clone()
            .unwrap_or_else(|| QueryNode::Bool(BoolQuery::new()));

        if let Some(filter) = &c.filter {
            match &mut query {
                QueryNode::Bool(bool_query) => bool_query.filter.push(filter.clone()),
                other => {
                    warn!(
                        query = %other.to_json(),
                        "Filter not attached: scoring query is not a bool query"
                    );
                    crate::metrics::record_filter_dropped();
                }
            }
        }

        SearchBody {
            source,
            size: c.limit,
            from: c.offset,
            sort: c.order.clone(),
            highlight: c.highlight.clone(),
            query,
            post_filter: c.post_filter.clone(),
            aggregations: c
                .aggregations
                .iter()
                .map(|a| (a.name.clone(), a.body.clone()))
                .collect(),
            min_score: c.min_score,
        }
    }

    /// Compile the count-only variant: no hits and no document bodies.
    pub fn count_body(&self) -> SearchBody {
        let mut body = self.compile();
        body.size = Some(0);
        body.source = Some(SourceSelection::Enabled(false));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(body: &SearchBody) -> String {
        serde_json::to_string(body).unwrap()
    }

    #[test]
    fn test_empty_compiles_to_match_all_bool() {
        let body = QueryCompiler::new().compile();
        assert_eq!(body.to_json().unwrap(), json!({"query": {"bool": {}}}));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let compiler = QueryCompiler::new()
            .select(["name"])
            .where_(json!({"name": "mark", "age <=": 35}))
            .unwrap()
            .post_filter(json!({"tags in": ["a"]}))
            .unwrap()
            .order("age")
            .aggregate(Aggregation::terms("by_tag", "tags"))
            .page(3, None);

        let first = render(&compiler.compile());
        let second = render(&compiler.compile());
        assert_eq!(first, second);
    }

    #[test]
    fn test_where_scenario() {
        let compiler = QueryCompiler::new()
            .where_(json!({"name": "mark", "age <=": 35}))
            .unwrap();

        assert_eq!(
            compiler.clause(Clause::Filter).unwrap(),
            json!({"bool": {"must": [
                {"term": {"name": "mark"}},
                {"range": {"age": {"lte": 35}}}
            ]}})
        );
        assert_eq!(
            compiler.compile().to_json().unwrap(),
            json!({"query": {"bool": {"filter": [
                {"bool": {"must": [
                    {"term": {"name": "mark"}},
                    {"range": {"age": {"lte": 35}}}
                ]}}
            ]}}})
        );
    }

    #[test]
    fn test_filter_and_post_filter_stay_separate() {
        let spec = json!({"tags in": ["cake"]});
        let body = QueryCompiler::new()
            .where_(spec.clone())
            .unwrap()
            .post_filter(spec)
            .unwrap()
            .compile()
            .to_json()
            .unwrap();

        let rendered = json!({"bool": {"must": [{"terms": {"tags": ["cake"]}}]}});
        assert_eq!(body["query"]["bool"]["filter"], json!([rendered.clone()]));
        assert_eq!(body["post_filter"], rendered);
    }

    #[test]
    fn test_page_defaults_to_25() {
        let body = QueryCompiler::new().page(10, None).compile();
        assert_eq!(body.from, Some(225));
        assert_eq!(body.size, Some(25));
    }

    #[test]
    fn test_page_with_limit() {
        let body = QueryCompiler::new().page(20, Some(50)).compile();
        assert_eq!(body.from, Some(950));
        assert_eq!(body.size, Some(50));
    }

    #[test]
    fn test_page_uses_stored_limit() {
        let body = QueryCompiler::new().limit(10).page(3, None).compile();
        assert_eq!(body.from, Some(20));
        assert_eq!(body.size, Some(10));
    }

    #[test]
    fn test_page_custom_default() {
        let body = QueryCompiler::with_default_page_size(40).page(2, None).compile();
        assert_eq!(body.from, Some(40));
        assert_eq!(body.size, Some(40));
    }

    #[test]
    fn test_page_saturates() {
        let body = QueryCompiler::new().page(usize::MAX, Some(usize::MAX)).compile();
        assert_eq!(body.from, Some(usize::MAX));

        let first = QueryCompiler::new().page(0, Some(10)).compile();
        assert_eq!(first.from, Some(0));
    }

    #[test]
    fn test_count_body_leaves_clauses_untouched() {
        let compiler = QueryCompiler::new()
            .select(["name"])
            .limit(5)
            .where_(json!({"a": 1}))
            .unwrap();
        let before = render(&compiler.compile());

        let count = compiler.count_body();
        assert_eq!(count.size, Some(0));
        assert_eq!(count.source, Some(SourceSelection::Enabled(false)));
        assert_eq!(count.to_json().unwrap()["_source"], json!(false));

        assert_eq!(render(&compiler.compile()), before);
        assert_eq!(compiler.clauses().limit, Some(5));
    }

    #[test]
    fn test_where_appends_into_must() {
        let compiler = QueryCompiler::new()
            .where_(json!({"a": 1}))
            .unwrap()
            .where_(QueryNode::exists("b"))
            .unwrap();
        assert_eq!(
            compiler.clauses().filter,
            Some(QueryNode::and([QueryNode::term("a", 1), QueryNode::exists("b")]))
        );
    }

    #[test]
    fn test_overwrite_where_replaces() {
        let compiler = QueryCompiler::new()
            .where_(json!({"a": 1}))
            .unwrap()
            .overwrite_where(json!({"b": 2}))
            .unwrap();
        assert_eq!(
            compiler.clauses().filter,
            Some(QueryNode::and([QueryNode::term("b", 2)]))
        );
    }

    #[test]
    fn test_query_must_and_should_share_slot() {
        let compiler = QueryCompiler::new()
            .query_must(json!({"title": "rust"}))
            .unwrap()
            .query_should(json!({"tags": "async", "tags ": "tokio"}))
            .unwrap();
        match &compiler.clauses().query {
            Some(QueryNode::Bool(b)) => {
                assert_eq!(b.must, vec![QueryNode::term("title", "rust")]);
                assert_eq!(b.should.len(), 2);
            }
            other => panic!("Expected Bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_overwrite_query_should() {
        let compiler = QueryCompiler::new()
            .query_must(json!({"a": 1}))
            .unwrap()
            .overwrite_query_should(json!({"b": 2}))
            .unwrap();
        assert_eq!(
            compiler.clauses().query,
            Some(QueryNode::or([QueryNode::term("b", 2)]))
        );
    }

    #[test]
    fn test_filter_merges_into_full_bool_query() {
        let body = QueryCompiler::new()
            .set_full_query(QueryNode::and([QueryNode::term("a", 1)]))
            .where_(json!({"b": 2}))
            .unwrap()
            .compile()
            .to_json()
            .unwrap();
        assert_eq!(
            body["query"],
            json!({"bool": {
                "must": [{"term": {"a": 1}}],
                "filter": [{"bool": {"must": [{"term": {"b": 2}}]}}]
            }})
        );
    }

    #[test]
    fn test_filter_not_attached_to_non_bool_query() {
        let body = QueryCompiler::new()
            .set_full_query(QueryNode::MatchAll)
            .where_(json!({"b": 2}))
            .unwrap()
            .compile()
            .to_json()
            .unwrap();
        assert_eq!(body, json!({"query": {"match_all": {}}}));
    }

    #[test]
    fn test_query_must_wraps_full_query() {
        let compiler = QueryCompiler::new()
            .set_full_query(QueryNode::MatchAll)
            .query_must(json!({"a": 1}))
            .unwrap();
        assert_eq!(
            compiler.clauses().query,
            Some(QueryNode::and([QueryNode::MatchAll, QueryNode::term("a", 1)]))
        );
    }

    #[test]
    fn test_select_dedupes_and_overwrites() {
        let compiler = QueryCompiler::new()
            .select(["a", "b"])
            .select(["b", "c"]);
        assert_eq!(compiler.clauses().fields, vec!["a", "b", "c"]);

        let compiler = compiler.overwrite_select(["z"]);
        assert_eq!(compiler.clause(Clause::Fields), Some(json!(["z"])));
    }

    #[test]
    fn test_order_preserves_insertion() {
        let compiler = QueryCompiler::new()
            .order(SortSpec::desc("age"))
            .order("name")
            .order(("score", SortOrder::Desc));
        assert_eq!(
            compiler.compile().to_json().unwrap()["sort"],
            json!([
                {"age": {"order": "desc"}},
                {"name": {"order": "asc"}},
                {"score": {"order": "desc"}}
            ])
        );

        let compiler =
            compiler.overwrite_order(SortSpec::asc("id").with_option("missing", "_last"));
        assert_eq!(
            compiler.clause(Clause::Order),
            Some(json!([{"id": {"order": "asc", "missing": "_last"}}]))
        );
    }

    #[test]
    fn test_full_document_shape() {
        let body = QueryCompiler::new()
            .select(["name"])
            .limit(10)
            .offset(20)
            .order("name")
            .highlight(json!({"fields": {"name": {}}}))
            .query_must(json!({"name": "mark"}))
            .unwrap()
            .post_filter(json!({"age >": 18}))
            .unwrap()
            .aggregate(Aggregation::terms("by_tag", "tags"))
            .min_score(0.5)
            .compile();

        let rendered = render(&body);
        let keys: Vec<String> = body
            .to_json()
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(
            keys,
            vec![
                "_source",
                "size",
                "from",
                "sort",
                "highlight",
                "query",
                "post_filter",
                "aggregations",
                "min_score"
            ]
        );
        assert!(rendered.contains(r#""aggregations":{"by_tag":{"terms":{"field":"tags"}}}"#));
    }

    #[test]
    fn test_clause_named() {
        let compiler = QueryCompiler::new().limit(7);
        assert_eq!(compiler.clause_named("limit").unwrap(), Some(json!(7)));
        assert_eq!(compiler.clause_named("postFilter").unwrap(), None);
        assert!(matches!(
            compiler.clause_named("having"),
            Err(OdmError::UnknownClause(_))
        ));
    }

    #[test]
    fn test_invalid_condition_propagates() {
        let result = QueryCompiler::new().where_(json!({"age ~": 1}));
        assert!(matches!(result, Err(OdmError::UnknownOperator { .. })));
    }

    #[test]
    fn test_preparsed_and_callback_conditions() {
        let compiler = QueryCompiler::new().where_(json!({"name": "mark"})).unwrap();

        // A rejected condition is caught before it reaches the compiler
        assert!(ConditionParser::parse(json!({"age ~": 1})).is_err());

        let nodes = ConditionParser::parse(json!({"age <=": 35})).unwrap();
        let compiler = compiler
            .where_(nodes)
            .unwrap()
            .query_must(Condition::from_fn(|| QueryNode::exists("email")))
            .unwrap();

        let body = compiler.compile().to_json().unwrap();
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({"bool": {"must": [
                {"term": {"name": "mark"}},
                {"range": {"age": {"lte": 35}}}
            ]}})
        );
        assert_eq!(body["query"]["bool"]["must"][0], json!({"exists": {"field": "email"}}));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
