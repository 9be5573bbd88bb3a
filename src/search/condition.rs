// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Condition Parser
//!
//! Turns declarative condition specs into Query AST nodes.
//!
//! # Condition Syntax
//!
//! ```text
//! "name": "mark"              - Term (operator defaults to =)
//! "age >": 29                 - Range gt   (also >=, <, <=)
//! "tags in": ["a", "b"]       - Terms
//! "tags not in": ["c"]        - NOT Terms
//! "email is": null            - NOT Exists (field missing)
//! "email is not": null        - Exists (field present)
//! "status !=": "draft"        - NOT Term
//! "or": {...}                 - nested spec, OR-combined
//! "and": {...}                - nested spec, AND-combined
//! "not": {...}                - nested spec, AND-combined then negated
//! "0": {...}                  - nested spec, ANDed with its siblings
//! ```
//!
//! Keys are parsed once into a [`ConditionKey`]; nothing downstream looks at
//! operator strings again.
//!
//! # Example
//!
//! ```rust
//! use search_odm::search::{ConditionParser, QueryNode};
//! use serde_json::json;
//!
//! let nodes = ConditionParser::parse(json!({"name": "mark", "age <=": 35})).unwrap();
//! assert_eq!(nodes, vec![QueryNode::term("name", "mark"), QueryNode::lte("age", 35)]);
//! ```

use std::str::FromStr;

use serde_json::Value;

use super::query_node::{Combinator, QueryNode};
use crate::error::OdmError;

/// Input accepted wherever conditions are expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Structured spec built in code
    Spec(ConditionSpec),
    /// Already-built node, passed through as-is
    Node(QueryNode),
    /// Already-parsed nodes, e.g. from an earlier [`ConditionParser::parse`]
    Nodes(Vec<QueryNode>),
    /// JSON object or array in the condition wire format
    Json(Value),
}

impl From<ConditionSpec> for Condition {
    fn from(spec: ConditionSpec) -> Self {
        Condition::Spec(spec)
    }
}

impl From<QueryNode> for Condition {
    fn from(node: QueryNode) -> Self {
        Condition::Node(node)
    }
}

impl From<Vec<QueryNode>> for Condition {
    fn from(nodes: Vec<QueryNode>) -> Self {
        Condition::Nodes(nodes)
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Json(value)
    }
}

impl Condition {
    /// Condition produced by a callback building the node
    pub fn from_fn(build: impl FnOnce() -> QueryNode) -> Self {
        Condition::Node(build())
    }
}

/// Ordered condition spec.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSpec {
    entries: Vec<(String, ConditionValue)>,
}

/// Value side of a spec entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Value(Value),
    Node(QueryNode),
    Spec(ConditionSpec),
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        ConditionValue::Value(value)
    }
}

impl From<QueryNode> for ConditionValue {
    fn from(node: QueryNode) -> Self {
        ConditionValue::Node(node)
    }
}

impl From<ConditionSpec> for ConditionValue {
    fn from(spec: ConditionSpec) -> Self {
        ConditionValue::Spec(spec)
    }
}

impl ConditionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. `key` is a field key (`"age >"`), a reserved group
    /// key (`and`, `or`, `not`) or an integer.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Add a field condition with a plain JSON value.
    pub fn field(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(key, ConditionValue::Value(value.into()))
    }

    /// Add a nested spec under the next integer key.
    pub fn group(self, spec: ConditionSpec) -> Self {
        let key = self.entries.len().to_string();
        self.with(key, spec)
    }

    pub fn and(self, spec: ConditionSpec) -> Self {
        self.with("and", spec)
    }

    pub fn or(self, spec: ConditionSpec) -> Self {
        self.with("or", spec)
    }

    pub fn not(self, spec: ConditionSpec) -> Self {
        self.with("not", spec)
    }

    /// Append a pre-built node under the next integer key.
    pub fn node(self, node: QueryNode) -> Self {
        let key = self.entries.len().to_string();
        self.with(key, node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a spec from the JSON wire format.
    ///
    /// Objects keep their key order; arrays get integer keys `0..n`.
    pub fn from_json(value: Value) -> Result<Self, OdmError> {
        match value {
            Value::Object(map) => Ok(Self {
                entries: map
                    .into_iter()
                    .map(|(k, v)| (k, ConditionValue::Value(v)))
                    .collect(),
            }),
            Value::Array(items) => Ok(Self {
                entries: items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), ConditionValue::Value(v)))
                    .collect(),
            }),
            other => Err(OdmError::InvalidCondition(format!(
                "condition spec must be an object or array, got {}",
                other
            ))),
        }
    }
}

/// Comparison operator parsed from a field key suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Is,
    IsNot,
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        // Collapse inner runs of whitespace ("not   in")
        let token = token.split_whitespace().collect::<Vec<_>>().join(" ");
        match token.as_str() {
            "" | "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "is" => Ok(Operator::Is),
            "is not" => Ok(Operator::IsNot),
            _ => Err(token),
        }
    }
}

/// Nested spec kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    And,
    Or,
    Not,
}

/// Typed form of a spec key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKey {
    Index(u64),
    Group(Group),
    Field { field: String, operator: Operator },
}

impl ConditionKey {
    pub fn parse(key: &str) -> Result<Self, OdmError> {
        let trimmed = key.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = trimmed.parse::<u64>() {
                return Ok(ConditionKey::Index(index));
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "and" => return Ok(ConditionKey::Group(Group::And)),
            "or" => return Ok(ConditionKey::Group(Group::Or)),
            "not" => return Ok(ConditionKey::Group(Group::Not)),
            _ => {}
        }

        let (field, token) = trimmed.split_once(' ').unwrap_or((trimmed, "="));
        let operator = token.parse::<Operator>().map_err(|operator| OdmError::UnknownOperator {
            key: key.to_string(),
            operator,
        })?;

        Ok(ConditionKey::Field {
            field: field.to_string(),
            operator,
        })
    }
}

/// Condition spec → Query AST
pub struct ConditionParser;

impl ConditionParser {
    /// Parse a condition into a list of nodes, preserving entry order.
    pub fn parse(condition: impl Into<Condition>) -> Result<Vec<QueryNode>, OdmError> {
        let parsed = match condition.into() {
            Condition::Node(node) => Ok(vec![node]),
            Condition::Nodes(nodes) => Ok(nodes),
            Condition::Spec(spec) => Self::parse_spec(spec),
            Condition::Json(value) => ConditionSpec::from_json(value).and_then(Self::parse_spec),
        };
        if let Err(e) = &parsed {
            crate::metrics::record_condition_error(e.kind());
        }
        parsed
    }

    fn parse_spec(spec: ConditionSpec) -> Result<Vec<QueryNode>, OdmError> {
        let mut nodes = Vec::with_capacity(spec.entries.len());

        for (raw_key, value) in spec.entries {
            if let ConditionValue::Node(node) = value {
                nodes.push(node);
                continue;
            }

            match ConditionKey::parse(&raw_key)? {
                ConditionKey::Index(_) => {
                    let mut inner = Self::parse_nested(&raw_key, value)?;
                    if inner.len() > 1 {
                        nodes.push(Combinator::And.combine(inner));
                    } else {
                        nodes.append(&mut inner);
                    }
                }
                ConditionKey::Group(Group::And) => {
                    nodes.push(Combinator::And.combine(Self::parse_nested(&raw_key, value)?));
                }
                ConditionKey::Group(Group::Or) => {
                    nodes.push(Combinator::Or.combine(Self::parse_nested(&raw_key, value)?));
                }
                ConditionKey::Group(Group::Not) => {
                    let inner = Combinator::And.combine(Self::parse_nested(&raw_key, value)?);
                    nodes.push(QueryNode::not(inner));
                }
                ConditionKey::Field { field, operator } => {
                    let value = match value {
                        ConditionValue::Value(v) => v,
                        _ => {
                            return Err(OdmError::InvalidCondition(format!(
                                "field key '{}' expects a value, not a nested spec",
                                raw_key
                            )))
                        }
                    };
                    nodes.push(Self::field_node(field, operator, value));
                }
            }
        }

        Ok(nodes)
    }

    fn parse_nested(key: &str, value: ConditionValue) -> Result<Vec<QueryNode>, OdmError> {
        match value {
            ConditionValue::Spec(spec) => Self::parse_spec(spec),
            ConditionValue::Node(node) => Ok(vec![node]),
            ConditionValue::Value(v @ (Value::Object(_) | Value::Array(_))) => {
                Self::parse_spec(ConditionSpec::from_json(v)?)
            }
            ConditionValue::Value(other) => Err(OdmError::InvalidCondition(format!(
                "key '{}' expects a nested spec, got {}",
                key, other
            ))),
        }
    }

    fn field_node(field: String, operator: Operator, value: Value) -> QueryNode {
        match operator {
            Operator::Gt => QueryNode::gt(field, value),
            Operator::Gte => QueryNode::gte(field, value),
            Operator::Lt => QueryNode::lt(field, value),
            Operator::Lte => QueryNode::lte(field, value),
            Operator::In => QueryNode::terms(field, Self::as_list(value)),
            Operator::NotIn => QueryNode::not(QueryNode::terms(field, Self::as_list(value))),
            // "is null" means the field is missing, "is not null" means it is present
            Operator::Is if value.is_null() => QueryNode::not(QueryNode::exists(field)),
            Operator::IsNot if value.is_null() => QueryNode::exists(field),
            Operator::Is => QueryNode::term(field, value),
            Operator::IsNot | Operator::Ne => QueryNode::not(QueryNode::term(field, value)),
            Operator::Eq => QueryNode::term(field, value),
        }
    }

    fn as_list(value: Value) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            other => vec![other],
        }
    }
}
