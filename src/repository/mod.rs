// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Repositories: one alias bound to an index, a document type and a client.
//!
//! # Architecture
//!
//! ```text
//! repo.query()  ──► QueryCompiler (default page size from config)
//!       │
//! repo.find(&q) ──► q.compile() ──► client.execute(index, body)
//!       │                                   │
//!       │                                   └─► RawResponse
//!       └────────────────────────────────────► ResultSet (hydrates on read)
//!
//! repo.count(&q)      ──► q.count_body() ──► client.execute ──► total
//! repo.delete_all(c)  ──► where(c)       ──► client.delete_by_query [──► refresh]
//! ```

pub mod options;
pub mod registry;

pub use options::DeleteOptions;
pub use registry::RepositoryRegistry;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{ClientError, SearchClient};
use crate::config::{OdmConfig, RepositorySettings};
use crate::document::{EmbedSpec, TypeRef, TypeRegistry};
use crate::error::OdmError;
use crate::hydrate::{Hydrator, ResultSet};
use crate::metrics;
use crate::search::{Condition, QueryCompiler, SearchBody};

pub struct Repository {
    settings: RepositorySettings,
    index: String,
    client: Arc<dyn SearchClient>,
    hydrator: Hydrator,
    default_page_size: usize,
    refresh_after_delete: bool,
}

impl Repository {
    /// Bind a repository.
    ///
    /// Fails with [`OdmError::MissingDocumentType`] when the document type
    /// or any reachable embed target is not registered.
    pub fn new(
        settings: RepositorySettings,
        client: Arc<dyn SearchClient>,
        types: &TypeRegistry,
        config: &OdmConfig,
    ) -> Result<Self, OdmError> {
        let hydrator = Hydrator::new(
            settings.alias.clone(),
            settings.document_type.clone(),
            settings.embeds.clone(),
            types,
        )?;
        let index = format!("{}{}", config.index_prefix, settings.index_name());

        Ok(Self {
            settings,
            index,
            client,
            hydrator,
            default_page_size: config.default_page_size,
            refresh_after_delete: config.refresh_after_delete,
        })
    }

    pub fn alias(&self) -> &str {
        &self.settings.alias
    }

    /// Full index name, prefix included
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn document_type(&self) -> &TypeRef {
        &self.settings.document_type
    }

    pub fn embeds(&self) -> &[EmbedSpec] {
        &self.settings.embeds
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    /// Empty compiler using this repository's default page size
    pub fn query(&self) -> QueryCompiler {
        QueryCompiler::with_default_page_size(self.default_page_size)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Round trips
    // ═══════════════════════════════════════════════════════════════════════════

    /// Compile and execute; hits are hydrated lazily by the returned set.
    pub async fn find(&self, compiler: &QueryCompiler) -> Result<ResultSet, OdmError> {
        let _timer = crate::time_operation!(self.alias(), "find");
        let body = compiler.compile();
        self.log_request("find", &body)?;

        let response = self
            .client
            .execute(&self.index, &body)
            .await
            .map_err(|e| self.fail("find", e))?;

        metrics::record_query(self.alias(), "find", "success");
        metrics::record_hits(self.alias(), response.hits.len());
        debug!(
            repository = %self.alias(),
            hits = response.hits.len(),
            total = response.total,
            "Search complete"
        );
        Ok(ResultSet::new(response, self.hydrator.clone()))
    }

    /// Total matches for the compiler's clauses, in a separate round trip.
    ///
    /// The compiler is only read.
    pub async fn count(&self, compiler: &QueryCompiler) -> Result<u64, OdmError> {
        let _timer = crate::time_operation!(self.alias(), "count");
        let body = compiler.count_body();
        self.log_request("count", &body)?;

        let response = self
            .client
            .execute(&self.index, &body)
            .await
            .map_err(|e| self.fail("count", e))?;

        metrics::record_query(self.alias(), "count", "success");
        Ok(response.total)
    }

    /// Delete every document matching `condition`. Returns the number deleted.
    pub async fn delete_all(
        &self,
        condition: impl Into<Condition>,
        options: &DeleteOptions,
    ) -> Result<u64, OdmError> {
        let _timer = crate::time_operation!(self.alias(), "delete");
        let body = QueryCompiler::new().where_(condition)?.compile();
        self.log_request("delete", &body)?;

        let response = self
            .client
            .delete_by_query(&self.index, &body)
            .await
            .map_err(|e| self.fail("delete", e))?;

        metrics::record_query(self.alias(), "delete", "success");
        metrics::record_deleted(self.alias(), response.deleted);
        debug!(
            repository = %self.alias(),
            deleted = response.deleted,
            context = ?options.context,
            "Delete by query complete"
        );

        if options.should_refresh(self.refresh_after_delete) {
            self.refresh().await?;
        }
        Ok(response.deleted)
    }

    /// Make recent writes visible to search
    pub async fn refresh(&self) -> Result<(), OdmError> {
        let _timer = crate::time_operation!(self.alias(), "refresh");
        self.client
            .refresh(&self.index)
            .await
            .map_err(|e| self.fail("refresh", e))?;
        metrics::record_query(self.alias(), "refresh", "success");
        Ok(())
    }

    fn log_request(&self, operation: &str, body: &SearchBody) -> Result<(), OdmError> {
        let rendered = body.to_json()?;
        debug!(
            repository = %self.alias(),
            index = %self.index,
            operation,
            body = %rendered,
            "Search request"
        );
        Ok(())
    }

    fn fail(&self, operation: &'static str, error: ClientError) -> OdmError {
        metrics::record_query(self.alias(), operation, "error");
        warn!(
            repository = %self.alias(),
            index = %self.index,
            operation,
            error = %error,
            "Search client error"
        );
        OdmError::Client(error)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("alias", &self.settings.alias)
            .field("index", &self.index)
            .field("document_type", &self.settings.document_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClient;
    use crate::document::DocumentType;
    use crate::search::QueryNode;
    use serde_json::json;

    fn setup(config: &OdmConfig) -> (Arc<InMemoryClient>, Repository) {
        let client = Arc::new(InMemoryClient::new());
        let types = TypeRegistry::new().with(DocumentType::new("User"));
        let repo = Repository::new(
            RepositorySettings::new("users").with_document_type(TypeRef::named("User")),
            client.clone(),
            &types,
            config,
        )
        .unwrap();
        (client, repo)
    }

    #[test]
    fn test_index_prefix() {
        let config = OdmConfig {
            index_prefix: "test_".into(),
            ..Default::default()
        };
        let (_, repo) = setup(&config);
        assert_eq!(repo.alias(), "users");
        assert_eq!(repo.index(), "test_users");
    }

    #[test]
    fn test_missing_document_type() {
        let err = Repository::new(
            RepositorySettings::new("users").with_document_type(TypeRef::named("User")),
            Arc::new(InMemoryClient::new()),
            &TypeRegistry::new(),
            &OdmConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OdmError::MissingDocumentType(name) if name == "User"));
    }

    #[test]
    fn test_query_uses_configured_page_size() {
        let config = OdmConfig {
            default_page_size: 10,
            ..Default::default()
        };
        let (_, repo) = setup(&config);
        let body = repo.query().page(3, None).compile();
        assert_eq!(body.size, Some(10));
        assert_eq!(body.from, Some(20));
    }

    #[tokio::test]
    async fn test_find_hydrates_with_alias() {
        let (client, repo) = setup(&OdmConfig::default());
        client.index_document("users", "1", json!({"name": "mark"})).unwrap();

        let mut results = repo.find(&repo.query()).await.unwrap();
        let doc = results.next().unwrap();
        assert_eq!(doc.source(), Some("users"));
        assert_eq!(doc.doc_type(), &TypeRef::named("User"));
        assert_eq!(doc.id().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_client_error_passes_through() {
        let (_, repo) = setup(&OdmConfig::default());
        let query = repo
            .query()
            .set_full_query(QueryNode::nested("comments", QueryNode::MatchAll));

        let err = repo.find(&query).await.unwrap_err();
        assert!(matches!(err, OdmError::Client(ClientError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_delete_refresh_policy() {
        let config = OdmConfig {
            refresh_after_delete: true,
            ..Default::default()
        };
        let (client, repo) = setup(&config);
        client.index_document("users", "1", json!({"name": "mark"})).unwrap();

        let deleted = repo
            .delete_all(json!({"name": "mark"}), &DeleteOptions::default())
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(client.requests().last().unwrap().operation, "refresh");

        client.clear_requests();
        repo.delete_all(json!({"name": "x"}), &DeleteOptions::without_refresh())
            .await
            .unwrap();
        assert!(client.requests().iter().all(|r| r.operation != "refresh"));
    }
}
