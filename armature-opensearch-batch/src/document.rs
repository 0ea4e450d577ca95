//! Document trait for typed bulk operations and export decoding.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for documents that can be written to and exported from OpenSearch.
///
/// # Example
///
/// ```rust
/// use armature_opensearch_batch::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct AuditEvent {
///     actor: String,
///     action: String,
///     at: i64,
/// }
///
/// impl Document for AuditEvent {
///     fn index_name() -> &'static str {
///         "audit-events"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the default index name for this document type.
    fn index_name() -> &'static str;

    /// Returns the routing key for this document (optional).
    fn routing(&self) -> Option<String> {
        None
    }
}
