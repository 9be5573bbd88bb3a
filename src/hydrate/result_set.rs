// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Lazily hydrated result set.
//!
//! A [`ResultSet`] owns the raw response of one search round trip and turns
//! hits into documents only when they are read:
//!
//! ```text
//!   Created ──next()/current()──► Iterating ──past last hit──► Exhausted
//! ```
//!
//! Stat accessors read the raw response and stay valid in every state.
//! [`ResultSet::snapshot`] and [`ResultSet::restore`] move a result set
//! across a serialization boundary; a restored set starts in `Created`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::hydrator::Hydrator;
use crate::client::RawResponse;
use crate::document::{Document, EmbedSpec, TypeRef, TypeRegistry};
use crate::error::OdmError;

/// Iteration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorState {
    Created,
    Iterating,
    Exhausted,
}

/// Serializable form of a [`ResultSet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSetSnapshot {
    pub response: RawResponse,
    pub source: String,
    #[serde(default)]
    pub document_type: TypeRef,
    #[serde(default)]
    pub embeds: Vec<EmbedSpec>,
}

pub struct ResultSet {
    response: RawResponse,
    hydrator: Hydrator,
    position: usize,
    state: CursorState,
}

impl ResultSet {
    pub fn new(response: RawResponse, hydrator: Hydrator) -> Self {
        Self {
            response,
            hydrator,
            position: 0,
            state: CursorState::Created,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Cursor
    // ═══════════════════════════════════════════════════════════════════════════

    /// Document at the cursor, hydrated on every call
    pub fn current(&mut self) -> Option<Document> {
        if self.state == CursorState::Created {
            self.state = CursorState::Iterating;
        }
        match self.response.hits.get(self.position) {
            Some(hit) => Some(self.hydrator.hydrate(hit)),
            None => {
                self.state = CursorState::Exhausted;
                None
            }
        }
    }

    /// Independent pass over all hits; re-hydrates each one and leaves the
    /// cursor untouched.
    pub fn iter(&self) -> impl Iterator<Item = Document> + '_ {
        self.response
            .hits
            .iter()
            .map(move |hit| self.hydrator.hydrate(hit))
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.position
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Stats (pass-through)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Hits in this page
    pub fn len(&self) -> usize {
        self.response.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response.hits.is_empty()
    }

    /// Total matching documents across all pages
    pub fn total_hits(&self) -> u64 {
        self.response.total
    }

    pub fn aggregations(&self) -> &Map<String, Value> {
        &self.response.aggregations
    }

    pub fn suggestions(&self) -> &Map<String, Value> {
        &self.response.suggestions
    }

    /// Highlight fragments keyed by hit id
    pub fn highlights(&self) -> Map<String, Value> {
        self.response
            .hits
            .iter()
            .filter_map(|hit| hit.highlight.as_ref().map(|h| (hit.id.clone(), h.clone())))
            .collect()
    }

    pub fn max_score(&self) -> Option<f64> {
        self.response.max_score
    }

    pub fn timed_out(&self) -> bool {
        self.response.timed_out
    }

    /// Server-side execution time in milliseconds
    pub fn took(&self) -> u64 {
        self.response.took
    }

    pub fn raw(&self) -> &RawResponse {
        &self.response
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Snapshot / restore
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn snapshot(&self) -> ResultSetSnapshot {
        ResultSetSnapshot {
            response: self.response.clone(),
            source: self.hydrator.source().to_string(),
            document_type: self.hydrator.root_type().clone(),
            embeds: self.hydrator.embeds().to_vec(),
        }
    }

    /// Rebuild a result set from a snapshot, positioned at the start.
    ///
    /// Document types are re-validated against `types`.
    pub fn restore(snapshot: ResultSetSnapshot, types: &TypeRegistry) -> Result<Self, OdmError> {
        let hydrator = Hydrator::new(
            snapshot.source,
            snapshot.document_type,
            snapshot.embeds,
            types,
        )?;
        Ok(Self::new(snapshot.response, hydrator))
    }
}

impl Iterator for ResultSet {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        let doc = self.current()?;
        self.position += 1;
        if self.position >= self.response.hits.len() {
            self.state = CursorState::Exhausted;
        }
        Some(doc)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.response.hits.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("source", &self.hydrator.source())
            .field("hits", &self.response.hits.len())
            .field("total", &self.response.total)
            .field("position", &self.position)
            .field("state", &self.state)
            .finish()
    }
}
