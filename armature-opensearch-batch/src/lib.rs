//! Deep exports and paced bulk writes for OpenSearch.
//!
//! This crate provides two request drivers on top of a search engine's
//! HTTP search and bulk APIs:
//! - [`PaginatedExporter`]: retrieves result sets larger than the engine's
//!   result window by chaining `search_after` cursors
//! - [`BatchedBulkWriter`]: splits a large, lazily generated set of write
//!   operations into bounded bulk requests, paces them, and aggregates
//!   per-item outcomes with optional version-conflict suppression
//!
//! Both drivers talk to the engine through the [`SearchCapability`] and
//! [`BulkCapability`] traits. [`OpenSearchClient`] implements them over the
//! `opensearch` crate; [`Retrying`] adds opt-in retries around either.
//!
//! # Example
//!
//! ```rust,no_run
//! use armature_opensearch_batch::{
//!     BulkOperation, BulkOptions, OpenSearchClient, OpenSearchConfig, PageRequest, SortOrder,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenSearchClient::new(OpenSearchConfig::new("http://localhost:9200"))?;
//!
//!     // Export every paid order, sorted so pages can be chained
//!     let orders = client
//!         .exporter()
//!         .export(|| {
//!             PageRequest::new()
//!                 .index("orders")
//!                 .term("status", "paid")
//!                 .sort_by("created_at", SortOrder::Asc)
//!                 .sort_by("order_id", SortOrder::Asc)
//!         })
//!         .await?;
//!
//!     // Archive them in paced batches of 500
//!     let hits = orders.hits();
//!     let options = BulkOptions::new()
//!         .batch_limit(500)
//!         .inter_batch_delay(Duration::from_millis(200))
//!         .ignore_version_conflicts(true);
//!
//!     let outcome = client
//!         .bulk_writer()
//!         .run(hits.len(), &options, |i| {
//!             let hit = &hits[i];
//!             Some(BulkOperation::create("orders-archive", hit.id.clone(), hit.source.clone()))
//!         })
//!         .await?;
//!
//!     println!("archived {}, failed {}", outcome.succeeded, outcome.errors.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bulk;
mod capability;
mod client;
mod config;
mod cursor;
mod document;
mod error;
mod export;
mod response;
mod retry;
mod search;
mod writer;

pub use bulk::{BulkAction, BulkItem, BulkItemError, BulkItemStatus, BulkOperation, BulkResponse};
pub use capability::{BulkCapability, SearchCapability};
pub use client::OpenSearchClient;
pub use config::{BulkOptions, ExportOptions, OpenSearchConfig, Refresh};
pub use cursor::{i64s_to_sort_values, strings_to_sort_values, Cursor};
pub use document::Document;
pub use error::{CombinedError, ItemFailure, OpenSearchError, Result, VERSION_CONFLICT};
pub use export::{export_with, PaginatedExporter};
pub use response::{
    parse_bulk_response, parse_bulk_response_ignore_conflicts, parse_bulk_response_strict,
    BulkSummary,
};
pub use retry::{BackoffStrategy, RetryConfig, Retrying};
pub use search::{Hit, PageRequest, ResultSet, SearchPage, SortOrder};
pub use writer::{BatchedBulkWriter, BulkOutcome};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BatchedBulkWriter, BulkCapability, BulkOperation, BulkOptions, BulkOutcome, Document,
        ExportOptions, OpenSearchClient, OpenSearchConfig, OpenSearchError, PageRequest,
        PaginatedExporter, Refresh, Result, SearchCapability, SortOrder,
    };
}
