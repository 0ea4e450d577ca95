//! Error types for export and bulk operations.

use std::fmt;
use thiserror::Error;

/// Bulk item error type reported by the engine for optimistic-concurrency failures.
pub const VERSION_CONFLICT: &str = "version_conflict_engine_exception";

/// OpenSearch error type.
#[derive(Error, Debug)]
pub enum OpenSearchError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid or missing input detected before any request was issued.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The engine answered with a non-success status.
    #[error("OpenSearch returned {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error reason extracted from the response body.
        reason: String,
    },

    /// The response could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A page could not be chained because its last hit has no sort values.
    #[error("Export requires sortable results: hit {id} in index {index} has no sort values")]
    MissingSortValues {
        /// Index of the offending hit.
        index: String,
        /// ID of the offending hit.
        id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request failed after all retries were used.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },

    /// Client error from opensearch crate.
    #[error("Client error: {0}")]
    Client(#[from] opensearch::Error),
}

impl OpenSearchError {
    /// Check whether a retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Client(e) => {
                e.is_timeout()
                    || e
                        .status_code()
                        .map(|s| s.as_u16() == 429 || s.is_server_error())
                        .unwrap_or(true)
            }
            _ => false,
        }
    }
}

/// Result type alias for OpenSearch operations.
pub type Result<T> = std::result::Result<T, OpenSearchError>;

/// A single bulk item that the engine rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Target index.
    pub index: String,
    /// Target document ID.
    pub id: String,
    /// HTTP status reported for the item.
    pub status: u16,
    /// Engine error type, e.g. `mapper_parsing_exception`.
    pub error_type: String,
    /// Human readable reason.
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "es error: {} [type={}]", self.reason, self.error_type)
    }
}

impl std::error::Error for ItemFailure {}

/// An error holding any number of item failures without dropping any of them.
///
/// An empty `CombinedError` means every submitted item either succeeded or was
/// a suppressed version conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedError {
    causes: Vec<ItemFailure>,
}

impl CombinedError {
    /// Create an empty combined error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one cause.
    pub fn push(&mut self, failure: ItemFailure) {
        self.causes.push(failure);
    }

    /// Append every cause of another combined error.
    pub fn append(&mut self, other: CombinedError) {
        self.causes.extend(other.causes);
    }

    /// True when no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    /// All recorded failures, in the order they were observed.
    pub fn causes(&self) -> &[ItemFailure] {
        &self.causes
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> std::result::Result<(), CombinedError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Extend<ItemFailure> for CombinedError {
    fn extend<I: IntoIterator<Item = ItemFailure>>(&mut self, iter: I) {
        self.causes.extend(iter);
    }
}

impl IntoIterator for CombinedError {
    type Item = ItemFailure;
    type IntoIter = std::vec::IntoIter<ItemFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.causes.into_iter()
    }
}

impl fmt::Display for CombinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.causes.as_slice() {
            [] => write!(f, "no bulk item failures"),
            [only] => write!(f, "{}", only),
            causes => {
                write!(f, "{} bulk items failed: ", causes.len())?;
                for (i, cause) in causes.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", cause)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CombinedError {}
