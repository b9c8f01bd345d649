//! Error taxonomy for Ocean operations
//!
//! Every fallible operation in the workspace returns [`OceanError`].
//! Validation failures are raised before any external call; upstream
//! failures (embedding provider, vector index, document store) are
//! surfaced explicitly so callers can retry.

use thiserror::Error;
use uuid::Uuid;

/// Result type for Ocean operations
pub type Result<T> = std::result::Result<T, OceanError>;

/// Error type shared by all Ocean services
#[derive(Error, Debug, Clone)]
pub enum OceanError {
    /// Input rejected before any external call (empty query, unknown
    /// enum value, missing required field, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity missing or outside the caller's tenant scope. The message
    /// is identical in both cases so cross-tenant existence never leaks.
    #[error("{kind} {id} not found or does not belong to organization")]
    NotFound { kind: &'static str, id: Uuid },

    /// A block-to-block link would close a cycle. Carries the discovered
    /// path for diagnostics, e.g. `A -> B -> A`.
    #[error("circular reference detected: {}", format_path(path))]
    CircularReference { path: Vec<Uuid> },

    /// Local uniqueness violation (duplicate tenant-scoped tag name,
    /// duplicate tag assignment on a block)
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external collaborator call failed or timed out. Retryable.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl OceanError {
    /// Validation error from anything displayable
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Not-found error for the given entity kind
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    /// Conflict error from anything displayable
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Upstream error from anything displayable
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Whether the caller may retry the operation as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

fn format_path(path: &[Uuid]) -> String {
    path.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
