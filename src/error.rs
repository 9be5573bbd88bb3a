// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Crate-level error type.

use thiserror::Error;

use crate::client::ClientError;

#[derive(Error, Debug)]
pub enum OdmError {
    /// Name-based dispatch to a combinator or finder that does not exist.
    #[error("Builder method not found: '{0}'")]
    MethodNotFound(String),

    /// A named document type (repository root or embed target) is not registered.
    #[error("Missing document type '{0}'")]
    MissingDocumentType(String),

    #[error("Unknown operator '{operator}' in condition key '{key}'")]
    UnknownOperator { key: String, operator: String },

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Unknown clause '{0}'")]
    UnknownClause(String),

    /// Failures from the search client, passed through unmodified.
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OdmError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotFound(_) => "method_not_found",
            Self::MissingDocumentType(_) => "missing_document_type",
            Self::UnknownOperator { .. } => "unknown_operator",
            Self::InvalidCondition(_) => "invalid_condition",
            Self::UnknownClause(_) => "unknown_clause",
            Self::Client(_) => "client",
            Self::Serialization(_) => "serialization",
        }
    }
}
