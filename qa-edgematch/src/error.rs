//! Error types for edge-match checks.

use thiserror::Error;

/// Edge-match errors.
///
/// Data quality problems are never errors; they are reported as issues.
/// These variants cover malformed construction input and failures of the
/// collaborators the engine consumes.
#[derive(Error, Debug)]
pub enum EdgeMatchError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Geometry of the wrong kind or otherwise unusable.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Malformed check configuration (class layout, parameters).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A row-pair condition or field option could not be parsed.
    #[error("Condition error: {0}")]
    Condition(String),

    /// Unknown class index passed to the engine or a data source.
    #[error("Unknown class index: {0}")]
    UnknownClass(usize),

    /// Tile lifecycle hooks called out of order.
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Feature data source failure.
    #[error("Source error: {0}")]
    Source(String),
}

impl EdgeMatchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn condition(msg: impl Into<String>) -> Self {
        Self::Condition(msg.into())
    }
}

/// Result type for edge-match operations.
pub type Result<T> = std::result::Result<T, EdgeMatchError>;
