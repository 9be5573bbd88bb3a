//! Configuration for search-odm.
//!
//! # Example
//!
//! ```
//! use search_odm::OdmConfig;
//!
//! // Minimal config (uses defaults)
//! let config = OdmConfig::default();
//! assert_eq!(config.default_page_size, 25);
//!
//! // From JSON
//! let config: OdmConfig = serde_json::from_str(r#"{
//!     "index_prefix": "prod_",
//!     "repositories": [
//!         {"alias": "users", "document_type": {"named": "User"},
//!          "embeds": [{"property": "address", "cardinality": "one", "target": {"named": "Address"}}]}
//!     ]
//! }"#).unwrap();
//! assert_eq!(config.repositories[0].index_name(), "users");
//! ```

use serde::Deserialize;

use crate::document::{EmbedSpec, TypeRef};
use crate::search::DEFAULT_PAGE_SIZE;

/// Top-level configuration.
///
/// All fields have defaults; an empty JSON object is a valid config.
#[derive(Debug, Clone, Deserialize)]
pub struct OdmConfig {
    /// Prepended to every repository's index name
    #[serde(default)]
    pub index_prefix: String,

    /// Page size used by `page()` when no limit was set (default: 25)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Refresh the index after every delete-by-query
    #[serde(default)]
    pub refresh_after_delete: bool,

    /// Repositories built by `RepositoryRegistry::load`
    #[serde(default)]
    pub repositories: Vec<RepositorySettings>,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            index_prefix: String::new(),
            default_page_size: default_page_size(),
            refresh_after_delete: false,
            repositories: Vec::new(),
        }
    }
}

/// Settings for one repository
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositorySettings {
    pub alias: String,

    /// Index name without prefix (defaults to the alias)
    #[serde(default)]
    pub index: Option<String>,

    #[serde(default)]
    pub document_type: TypeRef,

    /// Embeds for the root documents, merged with the document type's
    /// registered embeds. An entry here wins for the same property.
    #[serde(default)]
    pub embeds: Vec<EmbedSpec>,
}

impl RepositorySettings {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            index: None,
            document_type: TypeRef::Generic,
            embeds: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_document_type(mut self, document_type: TypeRef) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn with_embed(mut self, embed: EmbedSpec) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Index name without prefix
    pub fn index_name(&self) -> &str {
        self.index.as_deref().unwrap_or(&self.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Cardinality;

    #[test]
    fn test_defaults() {
        let config = OdmConfig::default();
        assert!(config.index_prefix.is_empty());
        assert_eq!(config.default_page_size, 25);
        assert!(!config.refresh_after_delete);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_empty_json_matches_default() {
        let config: OdmConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_page_size, OdmConfig::default().default_page_size);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_repository_settings_from_json() {
        let config: OdmConfig = serde_json::from_str(
            r#"{
                "default_page_size": 10,
                "refresh_after_delete": true,
                "repositories": [
                    {"alias": "users", "index": "people",
                     "embeds": [{"property": "tags", "cardinality": "many"}]},
                    {"alias": "posts"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_page_size, 10);
        assert!(config.refresh_after_delete);

        let users = &config.repositories[0];
        assert_eq!(users.index_name(), "people");
        assert_eq!(users.document_type, TypeRef::Generic);
        assert_eq!(users.embeds[0].cardinality, Cardinality::Many);

        assert_eq!(config.repositories[1].index_name(), "posts");
    }

    #[test]
    fn test_settings_builder() {
        let settings = RepositorySettings::new("users")
            .with_index("people_v2")
            .with_document_type(TypeRef::named("User"))
            .with_embed(EmbedSpec::one("address", TypeRef::Generic));

        assert_eq!(settings.index_name(), "people_v2");
        assert_eq!(settings.document_type, TypeRef::named("User"));
        assert_eq!(settings.embeds.len(), 1);
    }
}
