//! Capabilities the drivers consume.
//!
//! [`OpenSearchClient`](crate::OpenSearchClient) implements both; tests and
//! alternative transports can provide their own.

use crate::{
    bulk::{BulkOperation, BulkResponse},
    config::Refresh,
    error::Result,
    search::{PageRequest, SearchPage},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Executes one search request.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Run `request` and return one page of hits.
    async fn search(&self, request: &PageRequest) -> Result<SearchPage>;
}

/// Executes one bulk request.
#[async_trait]
pub trait BulkCapability: Send + Sync {
    /// Submit `operations` as a single bulk request.
    ///
    /// An `Err` means the request as a whole failed; per-item failures are
    /// reported inside the returned response.
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse>;
}

#[async_trait]
impl<T: SearchCapability + ?Sized> SearchCapability for Arc<T> {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        (**self).search(request).await
    }
}

#[async_trait]
impl<T: SearchCapability + ?Sized> SearchCapability for &T {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        (**self).search(request).await
    }
}

#[async_trait]
impl<T: BulkCapability + ?Sized> BulkCapability for Arc<T> {
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse> {
        (**self).bulk(operations, refresh).await
    }
}

#[async_trait]
impl<T: BulkCapability + ?Sized> BulkCapability for &T {
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse> {
        (**self).bulk(operations, refresh).await
    }
}
