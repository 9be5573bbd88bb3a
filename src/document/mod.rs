// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document model: the property-bag entity and the registry of named types.

pub mod entity;
pub mod types;

pub use entity::{Document, DocumentOptions, Property};
pub use types::{Cardinality, DocumentType, EmbedSpec, TypeRef, TypeRegistry};
