//! # Search ODM
//!
//! Object-document mapping for search engines: declarative conditions in,
//! typed documents out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ConditionParser                         │
//! │  • {"name": "mark", "age <=": 35, "or": {..}}              │
//! │  • → Vec<QueryNode> (term, terms, range, exists, bool)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      QueryCompiler                          │
//! │  • select / page / order / highlight / aggregate           │
//! │  • where_ (filter), query_must / query_should, post_filter │
//! │  • compile() → SearchBody, count_body()                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (Repository::find via SearchClient)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ResultSet / Hydrator                      │
//! │  • Hits hydrated on read, embeds expanded recursively      │
//! │  • Stats: total, aggregations, suggestions, highlights     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use search_odm::{
//!     DocumentType, EmbedSpec, InMemoryClient, OdmConfig, Repository,
//!     RepositorySettings, SortSpec, TypeRef, TypeRegistry,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), search_odm::OdmError> {
//!     let client = Arc::new(InMemoryClient::new());
//!     client.index_document("users", "1", json!({"name": "mark", "age": 35, "address": {"city": "Lisbon"}}))?;
//!
//!     let types = TypeRegistry::new()
//!         .with(DocumentType::new("User"))
//!         .with(DocumentType::new("Address"));
//!     let settings = RepositorySettings::new("users")
//!         .with_document_type(TypeRef::named("User"))
//!         .with_embed(EmbedSpec::one("address", TypeRef::named("Address")));
//!     let users = Repository::new(settings, client, &types, &OdmConfig::default())?;
//!
//!     let query = users
//!         .query()
//!         .where_(json!({"name": "mark", "age <=": 35}))?
//!         .order(SortSpec::desc("age"))
//!         .page(1, None);
//!
//!     for user in users.find(&query).await? {
//!         let address = user.get_one("address").expect("embedded");
//!         println!("{:?} lives in {:?}", user.id(), address.get_value("city"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`OdmConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`search`]: Condition parsing, query AST, DSL rendering and the compiler
//! - [`document`]: Property-bag documents and the type registry
//! - [`hydrate`]: Lazy hit → document hydration
//! - [`client`]: The search-client seam and an in-memory implementation
//! - [`repository`]: Repositories, the registry and per-call options

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod hydrate;
pub mod metrics;
pub mod repository;
pub mod search;

pub use client::{ClientError, InMemoryClient, RawHit, RawResponse, SearchClient};
pub use config::{OdmConfig, RepositorySettings};
pub use document::{
    Cardinality, Document, DocumentOptions, DocumentType, EmbedSpec, Property, TypeRef,
    TypeRegistry,
};
pub use error::OdmError;
pub use hydrate::{CursorState, Hydrator, ResultSet, ResultSetSnapshot};
pub use metrics::LatencyTimer;
pub use repository::{DeleteOptions, Repository, RepositoryRegistry};
pub use search::{
    Aggregation, Combinator, Condition, ConditionParser, ConditionSpec, QueryCompiler, QueryNode,
    SearchBody, SortOrder, SortSpec,
};
