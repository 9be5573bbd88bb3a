// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Raw hit → [`Document`].
//!
//! # Algorithm
//!
//! ```text
//! data = hit.data; data["id"] = hit.id
//! for embed in embeds where data has embed.property:
//!     One  → map            → Document(target)   (recursing into target's embeds)
//!     Many → [map, 7, map]  → [Document, Document] (non-maps dropped)
//! Document(root_type, data, mark_clean, !mark_new, source = alias)
//! ```
//!
//! Every call builds fresh documents; nothing is cached between calls.
//!
//! The embed table is resolved once, when the hydrator is built. Types
//! registered afterwards do not change how an existing hydrator expands hits.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::client::RawHit;
use crate::document::{
    Cardinality, Document, DocumentOptions, EmbedSpec, Property, TypeRef, TypeRegistry,
};
use crate::error::OdmError;
use crate::metrics;

#[derive(Clone)]
pub struct Hydrator {
    root_type: TypeRef,
    /// Embeds as configured for the repository
    embeds: Vec<EmbedSpec>,
    /// Configured embeds plus the root type's registered ones
    root_embeds: Vec<EmbedSpec>,
    /// Named type → its embeds, for every type reachable from the root
    graph: Arc<HashMap<String, Vec<EmbedSpec>>>,
    source: String,
}

impl Hydrator {
    /// Build a hydrator, checking that the root type and every reachable
    /// embed target are registered.
    ///
    /// Configured `embeds` take precedence over the root type's registered
    /// embeds for the same property.
    pub fn new(
        source: impl Into<String>,
        root_type: TypeRef,
        embeds: Vec<EmbedSpec>,
        types: &TypeRegistry,
    ) -> Result<Self, OdmError> {
        let graph = types.embed_graph(&root_type, &embeds)?;

        let mut root_embeds = embeds.clone();
        let registered = root_type.name().and_then(|name| graph.get(name));
        for embed in registered.into_iter().flatten() {
            if !root_embeds.iter().any(|e| e.property == embed.property) {
                root_embeds.push(embed.clone());
            }
        }

        Ok(Self {
            root_type,
            embeds,
            root_embeds,
            graph: Arc::new(graph),
            source: source.into(),
        })
    }

    pub fn root_type(&self) -> &TypeRef {
        &self.root_type
    }

    pub fn embeds(&self) -> &[EmbedSpec] {
        &self.embeds
    }

    /// Embeds expanded on the root document
    pub fn root_embeds(&self) -> &[EmbedSpec] {
        &self.root_embeds
    }

    /// Alias stamped on every hydrated document
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hydrate one hit
    pub fn hydrate(&self, hit: &RawHit) -> Document {
        let mut data = hit.data.clone();
        data.insert("id".to_string(), Value::String(hit.id.clone()));

        let doc = self.build(self.root_type.clone(), data, &self.root_embeds);
        metrics::record_hydrated(&self.source);
        doc
    }

    fn build(&self, doc_type: TypeRef, data: Map<String, Value>, embeds: &[EmbedSpec]) -> Document {
        let mut properties: IndexMap<String, Property> = data
            .into_iter()
            .map(|(k, v)| (k, Property::Value(v)))
            .collect();

        for embed in embeds {
            if let Some(slot) = properties.get_mut(&embed.property) {
                if let Property::Value(raw) = slot {
                    let raw = raw.take();
                    *slot = self.expand(embed, raw);
                }
            }
        }

        Document::from_properties(doc_type, properties, DocumentOptions::persisted(&self.source))
    }

    fn expand(&self, embed: &EmbedSpec, raw: Value) -> Property {
        let target_embeds = embed
            .target
            .name()
            .and_then(|name| self.graph.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match (embed.cardinality, raw) {
            (Cardinality::One, Value::Object(map)) => {
                Property::One(Box::new(self.build(embed.target.clone(), map, target_embeds)))
            }
            (Cardinality::Many, Value::Array(items)) => {
                let total = items.len();
                let docs: Vec<Document> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => {
                            Some(self.build(embed.target.clone(), map, target_embeds))
                        }
                        _ => None,
                    })
                    .collect();

                let dropped = total - docs.len();
                if dropped > 0 {
                    warn!(
                        property = %embed.property,
                        dropped,
                        "Dropped non-object entries from embedded list"
                    );
                    metrics::record_embed_dropped(&embed.property, dropped);
                }
                Property::Many(docs)
            }
            // Shape mismatch: keep the raw value
            (_, other) => Property::Value(other),
        }
    }
}
