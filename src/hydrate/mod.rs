// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Result hydration: raw hits become [`Document`](crate::document::Document)s
//! on demand.

pub mod hydrator;
pub mod result_set;

pub use hydrator::Hydrator;
pub use result_set::{CursorState, ResultSet, ResultSetSnapshot};
