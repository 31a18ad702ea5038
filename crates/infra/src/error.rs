//! Service-level error taxonomy.

use thiserror::Error;

use membership_adherents::ExportError;
use membership_core::DomainError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A sale, article, member or line item referenced by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent modification (stale version); retry with fresh data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or malformed input, rejected before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An incoming line item does not belong to the sale being updated.
    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::Lookup(msg) => ServiceError::Lookup(msg),
            DomainError::Unauthorized => ServiceError::Unauthorized,
        }
    }
}

impl From<ExportError> for ServiceError {
    fn from(value: ExportError) -> Self {
        match value {
            ExportError::UnknownProperty(_) => ServiceError::Validation(value.to_string()),
            other => ServiceError::Export(other.to_string()),
        }
    }
}
