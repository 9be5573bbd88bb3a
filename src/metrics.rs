// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search-odm.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `search_odm_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `repository`: repository alias
//! - `operation`: find, count, delete, refresh
//! - `status`: success, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a repository round trip outcome
pub fn record_query(repository: &str, operation: &str, status: &str) {
    counter!(
        "search_odm_queries_total",
        "repository" => repository.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record round trip latency
pub fn record_latency(repository: &str, operation: &str, duration: Duration) {
    histogram!(
        "search_odm_query_seconds",
        "repository" => repository.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record hits returned in one page
pub fn record_hits(repository: &str, count: usize) {
    histogram!(
        "search_odm_hits",
        "repository" => repository.to_string()
    )
    .record(count as f64);
}

/// Record documents removed by delete-by-query
pub fn record_deleted(repository: &str, count: u64) {
    counter!(
        "search_odm_deleted_documents_total",
        "repository" => repository.to_string()
    )
    .increment(count);
}

/// Record one hydrated hit
pub fn record_hydrated(source: &str) {
    counter!(
        "search_odm_hydrated_documents_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record embed entries dropped because they were not maps
pub fn record_embed_dropped(property: &str, count: usize) {
    counter!(
        "search_odm_embed_entries_dropped_total",
        "property" => property.to_string()
    )
    .increment(count as u64);
}

/// Record a rejected condition or clause
pub fn record_condition_error(kind: &str) {
    counter!(
        "search_odm_condition_errors_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a filter that could not be attached to a non-bool scoring query
pub fn record_filter_dropped() {
    counter!("search_odm_filters_dropped_total").increment(1);
}

/// Set the number of registered repositories
pub fn set_repositories(count: usize) {
    gauge!("search_odm_repositories").set(count as f64);
}

/// Timer guard that records latency on drop
pub struct LatencyTimer {
    repository: String,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(repository: impl Into<String>, operation: &'static str) -> Self {
        Self {
            repository: repository.into(),
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(&self.repository, self.operation, self.start.elapsed());
    }
}

/// Convenience macro for timing operations
#[macro_export]
macro_rules! time_operation {
    ($repository:expr, $op:expr) => {
        $crate::metrics::LatencyTimer::new($repository, $op)
    };
}
