// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Repository Registry
//!
//! Explicit, shareable map of alias → [`Repository`]. A repository is
//! created at most once per alias; later lookups return the same `Arc`.
//!
//! ```text
//! registry.get_or_create("users", factory)
//!       │
//!       ├─→ present? return it
//!       │
//!       └─→ factory() ─→ insert ─→ return it
//! ```

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use super::Repository;
use crate::client::SearchClient;
use crate::config::OdmConfig;
use crate::document::TypeRegistry;
use crate::error::OdmError;
use crate::metrics;

pub struct RepositoryRegistry {
    repositories: DashMap<String, Arc<Repository>>,
}

impl RepositoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repositories: DashMap::new(),
        }
    }

    /// Build every repository listed in `config`
    pub fn load(
        config: &OdmConfig,
        client: Arc<dyn SearchClient>,
        types: &TypeRegistry,
    ) -> Result<Self, OdmError> {
        let registry = Self::new();
        for settings in &config.repositories {
            registry.get_or_create(&settings.alias, || {
                Repository::new(settings.clone(), Arc::clone(&client), types, config)
            })?;
        }
        info!(repositories = registry.len(), "Repository registry loaded");
        Ok(registry)
    }

    /// Return the repository for `alias`, creating it with `factory` on first use.
    ///
    /// The factory runs while the alias slot is locked and must not call back
    /// into this registry. A failing factory leaves the alias unregistered.
    pub fn get_or_create<F>(&self, alias: &str, factory: F) -> Result<Arc<Repository>, OdmError>
    where
        F: FnOnce() -> Result<Repository, OdmError>,
    {
        if let Some(existing) = self.get(alias) {
            return Ok(existing);
        }

        let created = match self.repositories.entry(alias.to_string()) {
            Entry::Occupied(entry) => return Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let repository = Arc::new(factory()?);
                entry.insert(Arc::clone(&repository));
                repository
            }
        };

        info!(alias = %alias, index = %created.index(), "Repository registered");
        metrics::set_repositories(self.repositories.len());
        Ok(created)
    }

    pub fn get(&self, alias: &str) -> Option<Arc<Repository>> {
        self.repositories.get(alias).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.repositories.contains_key(alias)
    }

    pub fn remove(&self, alias: &str) -> Option<Arc<Repository>> {
        let removed = self.repositories.remove(alias).map(|(_, r)| r);
        if removed.is_some() {
            info!(alias = %alias, "Repository removed");
            metrics::set_repositories(self.repositories.len());
        }
        removed
    }

    pub fn clear(&self) {
        self.repositories.clear();
        metrics::set_repositories(0);
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Registered aliases, sorted
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.repositories.iter().map(|r| r.key().clone()).collect();
        aliases.sort();
        aliases
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
