// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! DSL Translator
//!
//! Translates the Query AST to the search-engine JSON query DSL.
//!
//! # Generated DSL
//!
//! ```text
//! {"term": {"name": "mark"}}                     - Exact match
//! {"terms": {"tags": ["cake", "php"]}}           - Any-of
//! {"range": {"age": {"gt": 29}}}                 - Range
//! {"exists": {"field": "email"}}                 - Presence
//! {"bool": {"must": [..], "should": [..],
//!           "must_not": [..], "filter": [..]}}   - Boolean (empty lists omitted)
//! {"nested": {"path": "comments", "query": ..}}  - Nested
//! {"match_all": {}}                              - Everything
//! ```

use serde_json::{json, Map, Value};

use super::query_node::{BoolQuery, QueryNode, RangeBounds};

/// Query DSL translator
pub struct DslTranslator;

impl DslTranslator {
    /// Translate a node (and its children) to DSL JSON
    pub fn translate(node: &QueryNode) -> Value {
        match node {
            QueryNode::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            QueryNode::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            QueryNode::Range { field, bounds } => {
                json!({ "range": { field.as_str(): Self::translate_bounds(bounds) } })
            }
            QueryNode::Exists { field } => json!({ "exists": { "field": field } }),
            QueryNode::Bool(bool_query) => json!({ "bool": Self::translate_bool(bool_query) }),
            QueryNode::Nested { path, query } => json!({
                "nested": { "path": path, "query": Self::translate(query) }
            }),
            QueryNode::MatchAll => json!({ "match_all": {} }),
            QueryNode::Script { source, params } => {
                let mut script = Map::new();
                script.insert("source".into(), Value::String(source.clone()));
                if !params.is_empty() {
                    script.insert("params".into(), Value::Object(params.clone()));
                }
                json!({ "script": { "script": script } })
            }
            QueryNode::Raw(dsl) => dsl.clone(),
        }
    }

    fn translate_bounds(bounds: &RangeBounds) -> Value {
        let mut out = Map::new();
        for (name, bound) in [
            ("gt", &bounds.gt),
            ("gte", &bounds.gte),
            ("lt", &bounds.lt),
            ("lte", &bounds.lte),
        ] {
            if let Some(value) = bound {
                out.insert(name.to_string(), value.clone());
            }
        }
        Value::Object(out)
    }

    fn translate_bool(bool_query: &BoolQuery) -> Value {
        let mut out = Map::new();
        for (name, clauses) in [
            ("must", &bool_query.must),
            ("should", &bool_query.should),
            ("must_not", &bool_query.must_not),
            ("filter", &bool_query.filter),
        ] {
            if !clauses.is_empty() {
                let rendered: Vec<Value> = clauses.iter().map(Self::translate).collect();
                out.insert(name.to_string(), Value::Array(rendered));
            }
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term() {
        let dsl = DslTranslator::translate(&QueryNode::term("name", "mark"));
        assert_eq!(dsl, json!({"term": {"name": "mark"}}));
    }

    #[test]
    fn test_terms() {
        let dsl = DslTranslator::translate(&QueryNode::terms("tags", ["cake", "php"]));
        assert_eq!(dsl, json!({"terms": {"tags": ["cake", "php"]}}));
    }

    #[test]
    fn test_range_single_bound() {
        let dsl = DslTranslator::translate(&QueryNode::gt("age", 29));
        assert_eq!(dsl, json!({"range": {"age": {"gt": 29}}}));
    }

    #[test]
    fn test_range_both_bounds() {
        let node = QueryNode::range(
            "age",
            RangeBounds {
                gte: Some(json!(18)),
                lt: Some(json!(65)),
                ..Default::default()
            },
        );
        assert_eq!(
            DslTranslator::translate(&node),
            json!({"range": {"age": {"gte": 18, "lt": 65}}})
        );
    }

    #[test]
    fn test_exists() {
        let dsl = DslTranslator::translate(&QueryNode::exists("email"));
        assert_eq!(dsl, json!({"exists": {"field": "email"}}));
    }

    #[test]
    fn test_bool_omits_empty_lists() {
        let node = QueryNode::or([QueryNode::term("a", 1)]);
        assert_eq!(
            DslTranslator::translate(&node),
            json!({"bool": {"should": [{"term": {"a": 1}}]}})
        );
    }

    #[test]
    fn test_empty_bool() {
        let node = QueryNode::Bool(BoolQuery::new());
        assert_eq!(DslTranslator::translate(&node), json!({"bool": {}}));
    }

    #[test]
    fn test_bool_clause_order() {
        let node = QueryNode::Bool(BoolQuery {
            must: vec![QueryNode::term("a", 1)],
            should: vec![QueryNode::term("b", 2)],
            must_not: vec![QueryNode::term("c", 3)],
            filter: vec![QueryNode::term("d", 4)],
        });
        let rendered = serde_json::to_string(&DslTranslator::translate(&node)).unwrap();
        assert_eq!(
            rendered,
            r#"{"bool":{"must":[{"term":{"a":1}}],"should":[{"term":{"b":2}}],"must_not":[{"term":{"c":3}}],"filter":[{"term":{"d":4}}]}}"#
        );
    }

    #[test]
    fn test_nested() {
        let node = QueryNode::nested("comments", QueryNode::term("comments.author", "jose"));
        assert_eq!(
            DslTranslator::translate(&node),
            json!({"nested": {"path": "comments", "query": {"term": {"comments.author": "jose"}}}})
        );
    }

    #[test]
    fn test_match_all() {
        assert_eq!(
            DslTranslator::translate(&QueryNode::MatchAll),
            json!({"match_all": {}})
        );
    }

    #[test]
    fn test_script() {
        let mut params = Map::new();
        params.insert("min".into(), json!(3));
        let node = QueryNode::script("doc['likes'].value > params.min", params);
        assert_eq!(
            DslTranslator::translate(&node),
            json!({"script": {"script": {
                "source": "doc['likes'].value > params.min",
                "params": {"min": 3}
            }}})
        );
    }

    #[test]
    fn test_raw_passthrough() {
        let raw = json!({"match_phrase": {"title": "quick fox"}});
        assert_eq!(DslTranslator::translate(&QueryNode::raw(raw.clone())), raw);
    }
}
