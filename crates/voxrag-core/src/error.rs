//! Error types for the VoxRAG engine.
//!
//! A single enum covers every failure mode the core can produce, so the
//! HTTP and CLI adapters can map errors to status codes / exit codes with
//! one `match`. Error codes follow the pattern `VOX-XXX`.

use thiserror::Error;

/// Result type alias for VoxRAG operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in VoxRAG operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector length did not match the store's dimension (VOX-001).
    #[error("[VOX-001] vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension recorded in the store header.
        expected: usize,
        /// Dimension of the vector the caller supplied.
        actual: usize,
    },

    /// A vector id was out of the store's valid range (VOX-002).
    #[error("[VOX-002] vector id {0} out of range")]
    VectorNotFound(u64),

    /// A document id was not found in the metadata store (VOX-003).
    #[error("[VOX-003] document '{0}' not found")]
    DocumentNotFound(String),

    /// A chunk id was not found in the metadata store (VOX-004).
    #[error("[VOX-004] chunk {0} not found")]
    ChunkNotFound(u64),

    /// The vector store file exists but has a bad magic or a dimension that
    /// disagrees with the header (VOX-005). Non-recoverable: the caller is
    /// expected to delete the file and re-ingest.
    #[error(
        "[VOX-005] vector store at {path} is incompatible: {reason} (delete the file to reset)"
    )]
    IncompatibleStore {
        /// Path to the offending store file.
        path: String,
        /// Human-readable reason (bad magic, dimension mismatch, truncated header).
        reason: String,
    },

    /// Underlying storage failure (VOX-006).
    #[error("[VOX-006] storage error: {0}")]
    Storage(String),

    /// Underlying I/O failure (VOX-007).
    #[error("[VOX-007] io error: {0}")]
    Io(#[from] std::io::Error),

    /// A metadata record failed to serialize/deserialize (VOX-008).
    #[error("[VOX-008] serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller-supplied input failed validation (VOX-009).
    #[error("[VOX-009] invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or contained an invalid value (VOX-010).
    #[error("[VOX-010] configuration error: {0}")]
    Config(String),

    /// The in-memory HNSW graph is in an inconsistent state (VOX-011).
    #[error("[VOX-011] index error: {0}")]
    Index(String),
}

impl Error {
    /// Returns the stable error code (e.g. `"VOX-001"`), used by both
    /// adapters for structured error responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "VOX-001",
            Self::VectorNotFound(_) => "VOX-002",
            Self::DocumentNotFound(_) => "VOX-003",
            Self::ChunkNotFound(_) => "VOX-004",
            Self::IncompatibleStore { .. } => "VOX-005",
            Self::Storage(_) => "VOX-006",
            Self::Io(_) => "VOX-007",
            Self::Serialization(_) => "VOX-008",
            Self::InvalidInput(_) => "VOX-009",
            Self::Config(_) => "VOX-010",
            Self::Index(_) => "VOX-011",
        }
    }

    /// Returns the taxonomy category from the error design (§7): one of
    /// `"validation"`, `"not_found"`, `"storage"`, or `"fatal_config"`.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::DimensionMismatch { .. } => "validation",
            Self::VectorNotFound(_) | Self::DocumentNotFound(_) | Self::ChunkNotFound(_) => {
                "not_found"
            }
            Self::IncompatibleStore { .. } | Self::Config(_) => "fatal_config",
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) | Self::Index(_) => "storage",
        }
    }
}
