// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query AST
//!
//! Typed query/filter nodes that render to the search-engine JSON DSL
//! (see [`DslTranslator`](super::DslTranslator)).
//!
//! # Example
//!
//! ```rust
//! use search_odm::search::QueryNode;
//! use serde_json::json;
//!
//! // Single nodes
//! let name = QueryNode::term("name", "mark");
//! let age = QueryNode::lte("age", 35);
//!
//! // Boolean combinations always produce a Bool node
//! let both = QueryNode::and([name.clone(), age.clone()]);
//! let either = QueryNode::or([name, age]);
//! let missing = QueryNode::not(QueryNode::exists("deleted_at"));
//!
//! assert_eq!(both.to_json(), json!({"bool": {"must": [
//!     {"term": {"name": "mark"}},
//!     {"range": {"age": {"lte": 35}}}
//! ]}}));
//! # let _ = (either, missing);
//! ```

use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::dsl_translator::DslTranslator;
use crate::error::OdmError;

/// Query AST node
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Exact value match: {"term": {field: value}}
    Term { field: String, value: Value },
    /// Any-of match: {"terms": {field: [values]}}
    Terms { field: String, values: Vec<Value> },
    /// Bounded comparison: {"range": {field: {gt, gte, lt, lte}}}
    Range { field: String, bounds: RangeBounds },
    /// Field presence: {"exists": {"field": field}}
    Exists { field: String },
    /// Boolean composition
    Bool(BoolQuery),
    /// Query against nested objects under `path`
    Nested { path: String, query: Box<QueryNode> },
    /// Matches every document
    MatchAll,
    /// Script query with optional params
    Script { source: String, params: Map<String, Value> },
    /// Pre-rendered DSL, emitted verbatim
    Raw(Value),
}

/// Bounds of a range node. Unset bounds are omitted from the DSL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

/// Clause lists of a Bool node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    /// Scoring AND
    pub must: Vec<QueryNode>,
    /// Scoring OR
    pub should: Vec<QueryNode>,
    /// Negation (filter context)
    pub must_not: Vec<QueryNode>,
    /// Non-scoring AND (filter context)
    pub filter: Vec<QueryNode>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no clause has been added. An empty Bool matches everything.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }
}

impl QueryNode {
    /// Create a term query: {"term": {field: value}}
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a terms query: {"terms": {field: [values]}}
    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a range query from explicit bounds
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Self::Range {
            field: field.into(),
            bounds,
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::range(field, RangeBounds { gt: Some(value.into()), ..Default::default() })
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::range(field, RangeBounds { gte: Some(value.into()), ..Default::default() })
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::range(field, RangeBounds { lt: Some(value.into()), ..Default::default() })
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::range(field, RangeBounds { lte: Some(value.into()), ..Default::default() })
    }

    /// Create an exists query: {"exists": {"field": field}}
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists { field: field.into() }
    }

    /// Create a nested query scoped to `path`
    pub fn nested(path: impl Into<String>, query: QueryNode) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    pub fn match_all() -> Self {
        Self::MatchAll
    }

    /// Create a script query
    pub fn script(source: impl Into<String>, params: Map<String, Value>) -> Self {
        Self::Script {
            source: source.into(),
            params,
        }
    }

    /// Wrap pre-rendered DSL
    pub fn raw(dsl: Value) -> Self {
        Self::Raw(dsl)
    }

    /// Combine with AND: Bool{must: nodes}
    pub fn and(nodes: impl IntoIterator<Item = QueryNode>) -> Self {
        Self::Bool(BoolQuery {
            must: nodes.into_iter().collect(),
            ..Default::default()
        })
    }

    /// Combine with OR: Bool{should: nodes}
    pub fn or(nodes: impl IntoIterator<Item = QueryNode>) -> Self {
        Self::Bool(BoolQuery {
            should: nodes.into_iter().collect(),
            ..Default::default()
        })
    }

    /// Negate: Bool{must_not: [node]}
    pub fn not(node: QueryNode) -> Self {
        Self::Bool(BoolQuery {
            must_not: vec![node],
            ..Default::default()
        })
    }

    /// Combine nodes with a combinator looked up by name.
    ///
    /// Accepts `and`, `or`, `and_` and `or_` (case-insensitive). Any other
    /// name fails with [`OdmError::MethodNotFound`].
    pub fn combine(method: &str, nodes: Vec<QueryNode>) -> Result<Self, OdmError> {
        Ok(method.parse::<Combinator>()?.combine(nodes))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Render to the search-engine JSON DSL
    pub fn to_json(&self) -> Value {
        DslTranslator::translate(self)
    }
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Boolean combinator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn combine(self, nodes: Vec<QueryNode>) -> QueryNode {
        match self {
            Combinator::And => QueryNode::and(nodes),
            Combinator::Or => QueryNode::or(nodes),
        }
    }
}

impl FromStr for Combinator {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" | "and_" => Ok(Combinator::And),
            "or" | "or_" => Ok(Combinator::Or),
            _ => Err(OdmError::MethodNotFound(s.to_string())),
        }
    }
}
