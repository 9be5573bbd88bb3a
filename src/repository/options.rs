//! Per-call options for repository writes.
//!
//! Options are built once by the caller and passed by reference; nothing
//! downstream mutates them.
//!
//! # Example
//!
//! ```rust
//! use search_odm::DeleteOptions;
//! use serde_json::json;
//!
//! // Follow the repository's configured refresh policy
//! let opts = DeleteOptions::default();
//!
//! // Make the deletion visible to the next search
//! let opts = DeleteOptions::refreshing().with_context("requested_by", json!("cleanup-job"));
//! assert_eq!(opts.context("requested_by"), Some(&json!("cleanup-job")));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

/// Options for [`Repository::delete_all`](super::Repository::delete_all).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    /// Refresh the index after deleting.
    ///
    /// `None` uses the repository's `refresh_after_delete` setting.
    ///
    /// Default: `None`
    pub refresh: Option<bool>,

    /// Call-scoped data readable by anything observing the call.
    pub context: BTreeMap<String, Value>,
}

impl DeleteOptions {
    /// Always refresh after deleting
    #[must_use]
    pub fn refreshing() -> Self {
        Self {
            refresh: Some(true),
            ..Self::default()
        }
    }

    /// Never refresh after deleting, whatever the repository says
    #[must_use]
    pub fn without_refresh() -> Self {
        Self {
            refresh: Some(false),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Resolve the refresh flag against the repository default
    #[must_use]
    pub fn should_refresh(&self, repository_default: bool) -> bool {
        self.refresh.unwrap_or(repository_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_follows_repository() {
        let opts = DeleteOptions::default();
        assert!(opts.refresh.is_none());
        assert!(opts.should_refresh(true));
        assert!(!opts.should_refresh(false));
    }

    #[test]
    fn test_refreshing_overrides() {
        assert!(DeleteOptions::refreshing().should_refresh(false));
        assert!(!DeleteOptions::without_refresh().should_refresh(true));
    }

    #[test]
    fn test_context() {
        let opts = DeleteOptions::default()
            .with_context("a", json!(1))
            .with_context("b", json!("two"));

        assert_eq!(opts.context("a"), Some(&json!(1)));
        assert_eq!(opts.context("b"), Some(&json!("two")));
        assert!(opts.context("c").is_none());
    }
}
