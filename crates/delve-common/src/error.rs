//! Error types for Delve.

use thiserror::Error;

use crate::ids::BlockTypeId;

/// Top-level error type for Delve operations.
#[derive(Debug, Error)]
pub enum DelveError {
    /// World generation/configuration errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A named save does not exist
    #[error("Save not found: {0}")]
    NotFound(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// World configuration errors.
///
/// These are raised when a generator is built, never while it runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// Map size must be positive
    #[error("Invalid map size: {0}")]
    InvalidMapSize(u32),

    /// A referenced block type is not registered
    #[error("Unknown block type: {0}")]
    UnknownBlock(BlockTypeId),

    /// An ore distribution entry is malformed
    #[error("Invalid ore distribution for {block}: {reason}")]
    InvalidOreSpec {
        /// Ore block type
        block: BlockTypeId,
        /// What is wrong with it
        reason: String,
    },

    /// Density outside `[0, 1]`
    #[error("Invalid cave density: {0}")]
    InvalidDensity(f32),
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Result type alias for Delve operations.
pub type DelveResult<T> = Result<T, DelveError>;
