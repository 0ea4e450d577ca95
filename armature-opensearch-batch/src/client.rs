//! OpenSearch-backed search and bulk capabilities.

use crate::{
    bulk::{BulkOperation, BulkResponse},
    capability::{BulkCapability, SearchCapability},
    config::{OpenSearchConfig, Refresh},
    error::{OpenSearchError, Result},
    export::PaginatedExporter,
    search::{PageRequest, SearchPage},
    writer::BatchedBulkWriter,
};
use async_trait::async_trait;
use opensearch::{
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Url,
    },
    OpenSearch,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// OpenSearch client implementing [`SearchCapability`] and [`BulkCapability`].
///
/// Requests go to a single node: the first of the configured URLs.
#[derive(Clone)]
pub struct OpenSearchClient {
    client: Arc<OpenSearch>,
    config: Arc<OpenSearchConfig>,
    node_url: Url,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client.
    ///
    /// Only the first URL is contacted. Additional URLs are ignored with a warning.
    pub fn new(config: OpenSearchConfig) -> Result<Self> {
        info!(urls = ?config.urls, "Initializing OpenSearch client");

        let url = config
            .node_url()
            .ok_or_else(|| OpenSearchError::Configuration("No URLs provided".to_string()))?;

        let node_url = Url::parse(url)
            .map_err(|e| OpenSearchError::Configuration(format!("Invalid URL: {}", e)))?;

        if config.urls.len() > 1 {
            warn!(
                node = %node_url,
                ignored = config.urls.len() - 1,
                "Multiple URLs configured; only the first node is used"
            );
        }

        let conn_pool = SingleNodeConnectionPool::new(node_url.clone());
        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout)
            .disable_proxy();

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            let credentials = opensearch::auth::Credentials::Basic(user.clone(), pass.clone());
            builder = builder.auth(credentials);
        }

        let transport = builder
            .build()
            .map_err(|e| OpenSearchError::Connection(e.to_string()))?;

        debug!("OpenSearch client initialized");

        Ok(Self {
            client: Arc::new(OpenSearch::new(transport)),
            config: Arc::new(config),
            node_url,
        })
    }

    /// Create a client from `OPENSEARCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenSearchConfig::from_env()?)
    }

    /// Get the underlying OpenSearch client.
    pub fn inner(&self) -> &OpenSearch {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenSearchConfig {
        &self.config
    }

    /// The node every request is sent to.
    pub fn node_url(&self) -> &Url {
        &self.node_url
    }

    /// Exporter over this client with default options.
    pub fn exporter(&self) -> PaginatedExporter<OpenSearchClient> {
        PaginatedExporter::new(self.clone())
    }

    /// Bulk writer over this client.
    pub fn bulk_writer(&self) -> BatchedBulkWriter<OpenSearchClient> {
        BatchedBulkWriter::new(self.clone())
    }

    /// Refresh an index to make recent changes searchable.
    pub async fn refresh(&self, index: &str) -> Result<()> {
        debug!(index, "Refreshing index");

        let response = self
            .client
            .indices()
            .refresh(opensearch::indices::IndicesRefreshParts::Index(&[index]))
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    /// Ping the cluster.
    pub async fn ping(&self) -> Result<bool> {
        let response = self.client.ping().send().await;
        Ok(response.is_ok())
    }
}

#[async_trait]
impl SearchCapability for OpenSearchClient {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        let index_refs: Vec<&str> = request.index_names().iter().map(|s| s.as_str()).collect();
        let parts = if index_refs.is_empty() {
            opensearch::SearchParts::None
        } else {
            opensearch::SearchParts::Index(&index_refs)
        };

        let response = self.client.search(parts).body(request.to_body()).send().await?;
        let result = ensure_success(response).await?;

        SearchPage::from_response(&result)
    }
}

#[async_trait]
impl BulkCapability for OpenSearchClient {
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for op in operations {
            body.extend(op.to_bulk_lines().into_iter().map(JsonBody::from));
        }

        let response = self
            .client
            .bulk(opensearch::BulkParts::None)
            .refresh(match refresh {
                Refresh::False => opensearch::params::Refresh::False,
                Refresh::True => opensearch::params::Refresh::True,
                Refresh::WaitFor => opensearch::params::Refresh::WaitFor,
            })
            .body(body)
            .send()
            .await?;

        let result = ensure_success(response).await?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Read the JSON body, mapping non-success statuses to [`OpenSearchError::Status`].
async fn ensure_success(response: opensearch::http::response::Response) -> Result<Value> {
    let status = response.status_code();
    let body: Value = response.json().await?;

    if !status.is_success() {
        return Err(OpenSearchError::Status {
            status: status.as_u16(),
            reason: error_reason(&body),
        });
    }

    Ok(body)
}

fn error_reason(body: &Value) -> String {
    body.get("error")
        .and_then(|e| e.get("reason").and_then(|r| r.as_str()).or_else(|| e.as_str()))
        .unwrap_or("Unknown error")
        .to_string()
}

impl std::fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("node_url", &self.node_url.as_str())
            .field("urls", &self.config.urls)
            .finish()
    }
}
