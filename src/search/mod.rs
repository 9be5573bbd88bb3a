// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Query Infrastructure
//!
//! Declarative conditions in, search request bodies out.
//!
//! # Architecture
//!
//! ```text
//! Condition spec (JSON / ConditionSpec / QueryNode)
//!     ↓
//! ConditionParser → Vec<QueryNode> (AST)
//!     ↓
//! QueryCompiler (clause slots: fields, paging, sort, highlight,
//!                aggregations, query, filter, post_filter, min_score)
//!     ↓
//! SearchBody → DslTranslator → JSON request body
//! ```
//!
//! # Condition Language
//!
//! ```text
//! {"name": "mark"}                  - term
//! {"age >": 29}                     - range (>, >=, <, <=)
//! {"tags in": ["cake", "php"]}      - terms
//! {"tags not in": ["java"]}         - NOT terms
//! {"email is": null}                - field missing
//! {"email is not": null}            - field present
//! {"status !=": "draft"}            - NOT term
//! {"or": {...}} {"and": {...}} {"not": {...}}
//! ```

mod compiler;
mod condition;
mod dsl_translator;
mod query_node;

pub use compiler::{
    Aggregation, Clause, Clauses, QueryCompiler, SearchBody, SortOrder, SortSpec,
    SourceSelection, DEFAULT_PAGE_SIZE,
};
pub use condition::{
    Condition, ConditionKey, ConditionParser, ConditionSpec, ConditionValue, Group, Operator,
};
pub use dsl_translator::DslTranslator;
pub use query_node::{BoolQuery, Combinator, QueryNode, RangeBounds};
