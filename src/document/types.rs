// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document types and embed associations.
//!
//! A [`TypeRef`] names what a hit (or an embedded sub-structure) hydrates
//! into. `Generic` is the property-bag fallback and never fails; a `Named`
//! reference must resolve in the [`TypeRegistry`].
//!
//! Named types carry their own embeds, so an embed targeting `Address`
//! expands `Address`'s embeds in turn:
//!
//! ```text
//! user  ── address (One)  → Address ── geo (One) → Geo
//!       └─ comments (Many) → Comment
//! ```

use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::OdmError;

/// How many sub-documents an embedded property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Reference to a document type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeRef {
    #[default]
    Generic,
    Named(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Generic => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => f.write_str("generic"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Embed association: `property` holds one or many sub-documents of `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedSpec {
    pub property: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub target: TypeRef,
}

impl EmbedSpec {
    pub fn one(property: impl Into<String>, target: TypeRef) -> Self {
        Self {
            property: property.into(),
            cardinality: Cardinality::One,
            target,
        }
    }

    pub fn many(property: impl Into<String>, target: TypeRef) -> Self {
        Self {
            property: property.into(),
            cardinality: Cardinality::Many,
            target,
        }
    }
}

/// A named document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub name: String,
    #[serde(default)]
    pub embeds: Vec<EmbedSpec>,
}

impl DocumentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            embeds: Vec::new(),
        }
    }

    pub fn embed_one(mut self, property: impl Into<String>, target: TypeRef) -> Self {
        self.embeds.push(EmbedSpec::one(property, target));
        self
    }

    pub fn embed_many(mut self, property: impl Into<String>, target: TypeRef) -> Self {
        self.embeds.push(EmbedSpec::many(property, target));
        self
    }
}

/// Registry of named document types.
///
/// Types are registered during setup and read during hydration.
pub struct TypeRegistry {
    types: DashMap<String, DocumentType>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Register (or replace) a type
    pub fn register(&self, doc_type: DocumentType) {
        self.types.insert(doc_type.name.clone(), doc_type);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(self, doc_type: DocumentType) -> Self {
        self.register(doc_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<DocumentType> {
        self.types.get(name).map(|t| t.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a type reference.
    ///
    /// `Generic` resolves to `None`; an unregistered `Named` type is an error.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Option<DocumentType>, OdmError> {
        match type_ref {
            TypeRef::Generic => Ok(None),
            TypeRef::Named(name) => self
                .get(name)
                .map(Some)
                .ok_or_else(|| OdmError::MissingDocumentType(name.clone())),
        }
    }

    /// Embeds a document of `type_ref` expands when hydrated
    pub fn embeds_of(&self, type_ref: &TypeRef) -> Vec<EmbedSpec> {
        type_ref
            .name()
            .and_then(|name| self.types.get(name).map(|t| t.embeds.clone()))
            .unwrap_or_default()
    }

    /// Check that `root` and every embed target reachable from it or from
    /// `embeds` resolve.
    pub fn validate(&self, root: &TypeRef, embeds: &[EmbedSpec]) -> Result<(), OdmError> {
        self.embed_graph(root, embeds).map(|_| ())
    }

    /// Resolve every named type reachable from `root` and `embeds` into a
    /// name → embeds table. The root type's own embeds are walked too.
    /// Cyclic type graphs are fine; each type is resolved once.
    pub fn embed_graph(
        &self,
        root: &TypeRef,
        embeds: &[EmbedSpec],
    ) -> Result<HashMap<String, Vec<EmbedSpec>>, OdmError> {
        let mut graph = HashMap::new();
        let mut pending: Vec<TypeRef> = embeds.iter().rev().map(|e| e.target.clone()).collect();
        pending.push(root.clone());

        while let Some(type_ref) = pending.pop() {
            let Some(name) = type_ref.name() else {
                continue;
            };
            if graph.contains_key(name) {
                continue;
            }
            let doc_type = self
                .get(name)
                .ok_or_else(|| OdmError::MissingDocumentType(name.to_string()))?;
            pending.extend(doc_type.embeds.iter().rev().map(|e| e.target.clone()));
            graph.insert(doc_type.name, doc_type.embeds);
        }
        Ok(graph)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(DocumentType::new("User").embed_one("address", TypeRef::named("Address")))
            .with(DocumentType::new("Address").embed_one("geo", TypeRef::named("Geo")))
            .with(DocumentType::new("Geo"))
    }

    #[test]
    fn test_generic_resolves_to_none() {
        let types = TypeRegistry::new();
        assert!(types.resolve(&TypeRef::Generic).unwrap().is_none());
    }

    #[test]
    fn test_named_resolves() {
        let types = registry();
        let user = types.resolve(&TypeRef::named("User")).unwrap().unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.embeds.len(), 1);
    }

    #[test]
    fn test_missing_named_type() {
        let types = registry();
        let err = types.resolve(&TypeRef::named("Nope")).unwrap_err();
        assert!(matches!(err, OdmError::MissingDocumentType(name) if name == "Nope"));
    }

    #[test]
    fn test_validate_recurses_into_targets() {
        let types = TypeRegistry::new()
            .with(DocumentType::new("User"))
            .with(DocumentType::new("Address").embed_one("geo", TypeRef::named("Geo")));

        let embeds = vec![EmbedSpec::one("address", TypeRef::named("Address"))];
        let err = types.validate(&TypeRef::named("User"), &embeds).unwrap_err();
        assert!(matches!(err, OdmError::MissingDocumentType(name) if name == "Geo"));
    }

    #[test]
    fn test_validate_handles_cycles() {
        let types = TypeRegistry::new()
            .with(DocumentType::new("Node").embed_many("children", TypeRef::named("Node")));
        let embeds = types.embeds_of(&TypeRef::named("Node"));
        assert!(types.validate(&TypeRef::named("Node"), &embeds).is_ok());
    }

    #[test]
    fn test_validate_walks_root_type_embeds() {
        // The root type's own embeds are checked even when an embed cycles back to it
        let types = TypeRegistry::new()
            .with(DocumentType::new("User").embed_one("pet", TypeRef::named("Pet")));
        let embeds = vec![EmbedSpec::one("friend", TypeRef::named("User"))];

        let err = types.validate(&TypeRef::named("User"), &embeds).unwrap_err();
        assert!(matches!(err, OdmError::MissingDocumentType(name) if name == "Pet"));

        let err = types.validate(&TypeRef::named("User"), &[]).unwrap_err();
        assert!(matches!(err, OdmError::MissingDocumentType(name) if name == "Pet"));
    }

    #[test]
    fn test_embed_graph_covers_reachable_types() {
        let types = registry().with(DocumentType::new("Unused"));
        let graph = types.embed_graph(&TypeRef::named("User"), &[]).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph["Address"], vec![EmbedSpec::one("geo", TypeRef::named("Geo"))]);
        assert!(graph["Geo"].is_empty());
        assert!(!graph.contains_key("Unused"));
    }

    #[test]
    fn test_validate_generic_root_and_targets() {
        let types = TypeRegistry::new();
        let embeds = vec![EmbedSpec::many("tags", TypeRef::Generic)];
        assert!(types.validate(&TypeRef::Generic, &embeds).is_ok());
    }

    #[test]
    fn test_embeds_of() {
        let types = registry();
        assert_eq!(
            types.embeds_of(&TypeRef::named("Address")),
            vec![EmbedSpec::one("geo", TypeRef::named("Geo"))]
        );
        assert!(types.embeds_of(&TypeRef::Generic).is_empty());
        assert!(types.embeds_of(&TypeRef::named("Unknown")).is_empty());
    }

    #[test]
    fn test_type_ref_serde() {
        let json = serde_json::to_value(TypeRef::named("User")).unwrap();
        assert_eq!(json, serde_json::json!({"named": "User"}));
        let generic: TypeRef = serde_json::from_value(serde_json::json!("generic")).unwrap();
        assert_eq!(generic, TypeRef::Generic);
    }

    #[test]
    fn test_embed_spec_deserialize_defaults_target() {
        let spec: EmbedSpec =
            serde_json::from_value(serde_json::json!({"property": "tags", "cardinality": "many"}))
                .unwrap();
        assert_eq!(spec, EmbedSpec::many("tags", TypeRef::Generic));
    }
}
