//! Error types for pgrecord

use thiserror::Error;

/// Result type alias for pgrecord operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for builder, model and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Missing table, missing connection, unknown model or a malformed relation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Undefined relation name or unsupported relation kind
    #[error("Relation error: {0}")]
    Relation(String),

    /// Query execution error reported by the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a relation error
    pub fn relation(message: impl Into<String>) -> Self {
        Self::Relation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// The error raised by every model operation run without a connection.
    pub(crate) fn not_initialized() -> Self {
        Self::configuration("database connection is not initialized")
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a relation error
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }
}
