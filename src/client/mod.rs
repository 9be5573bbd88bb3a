// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search-engine client seam.
//!
//! [`SearchClient`] is the only way compiled queries leave this crate.
//! [`InMemoryClient`] implements it over in-process documents.

pub mod memory;
pub mod traits;

pub use memory::{InMemoryClient, RecordedRequest};
pub use traits::{ClientError, DeleteByQueryResponse, RawHit, RawResponse, SearchClient};
