use thiserror::Error;

use crate::id::MemoryId;

/// Errors raised at the memory aggregate boundary.
///
/// Anchor divergence is not an error; it is reported through
/// [`IntegrityResult`](crate::memory::IntegrityResult), not as a failure.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("confidence must be a finite value in [0, 1], got {0}")]
    InvalidConfidence(f64),

    #[error("required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("{field} exceeds maximum length ({len}/{max} chars)")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unknown memory type: {0}")]
    UnknownMemoryType(String),

    #[error("unknown attestation: {0}")]
    UnknownAttestation(String),

    #[error("unknown anchor type: {0}")]
    UnknownAnchorType(String),

    #[error("predecessor not found in lineage index: {0}")]
    UnknownPredecessor(MemoryId),

    #[error("memory {id} is already superseded by {successor}")]
    AlreadySuperseded { id: MemoryId, successor: MemoryId },

    #[error("memory {0} cannot reference itself in its lineage")]
    SelfReference(MemoryId),

    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),

    #[error("invalid memory record: {0}")]
    InvalidRecord(String),

    #[error("stored trust score {stored} does not match recomputed score {recomputed}")]
    TrustMismatch { stored: f64, recomputed: f64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
