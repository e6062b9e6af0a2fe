/// Error types for refdb operations.
///
/// The transform core (`convert`, `serializer`, `parser`) never fails. Errors
/// only come from argument validation at the façade boundary, lookups of
/// unknown ids, and the store itself.
use thiserror::Error;

/// The main error type for refdb operations.
#[derive(Error, Debug)]
pub enum RefDbError {
    /// A required argument was null, empty or of the wrong shape
    #[error("{name} must not be null")]
    InvalidArgument {
        /// Name of the offending argument
        name: String,
    },

    /// No item is stored under the given id
    #[error("unknown id({id}) for ref({path})")]
    UnknownId {
        /// The id that was looked up
        id: String,
        /// The ref path the id was looked up under
        path: String,
    },

    /// Serialization error when converting data to/from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store or snapshot operation failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RefDbError {
    /// Shorthand for [`RefDbError::InvalidArgument`].
    pub fn invalid_argument(name: impl Into<String>) -> Self {
        Self::InvalidArgument { name: name.into() }
    }
}

/// Result type alias for refdb operations.
pub type RefDbResult<T> = Result<T, RefDbError>;
