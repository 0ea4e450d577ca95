//! In-memory capabilities for driver tests.

#![allow(dead_code)]

use armature_opensearch_batch::{
    BulkCapability, BulkItem, BulkItemError, BulkItemStatus, BulkOperation, BulkResponse, Hit,
    OpenSearchError, PageRequest, Refresh, Result, SearchCapability, SearchPage,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

pub fn hit(n: u64) -> Hit {
    Hit {
        id: format!("doc-{}", n),
        index: "events".to_string(),
        source: json!({ "n": n }),
        sort: vec![json!(n), json!(format!("doc-{}", n))],
        ..Default::default()
    }
}

/// Serves a fixed corpus of `total` sorted hits through `search_after`.
///
/// Rejects any cursor that is not the sort vector of a hit it served.
pub struct CorpusSearch {
    total: u64,
    pub requests: Mutex<Vec<PageRequest>>,
}

impl CorpusSearch {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchCapability for CorpusSearch {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        self.requests.lock().unwrap().push(request.clone());

        let size = request.requested_size().unwrap_or(10) as u64;
        let start = match request.cursor() {
            None => 0,
            Some(cursor) => match cursor.values() {
                [Value::Number(n), Value::String(id)]
                    if n.as_u64().map(|n| format!("doc-{}", n)).as_deref() == Some(id.as_str()) =>
                {
                    n.as_u64().unwrap_or(0) + 1
                }
                other => {
                    return Err(OpenSearchError::Status {
                        status: 400,
                        reason: format!("unexpected search_after {:?}", other),
                    })
                }
            },
        };

        let end = (start + size).min(self.total);
        let mut page = SearchPage::with_hits((start..end).map(hit).collect());
        page.total = self.total;
        Ok(page)
    }
}

/// Returns pre-scripted pages in order, one per call.
pub struct ScriptedSearch {
    pages: Mutex<Vec<Result<SearchPage>>>,
    pub requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSearch {
    pub fn new(pages: Vec<Result<SearchPage>>) -> Self {
        let mut pages = pages;
        pages.reverse();
        Self {
            pages: Mutex::new(pages),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchCapability for ScriptedSearch {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| {
                Err(OpenSearchError::Connection("no more scripted pages".to_string()))
            })
    }
}

/// One bulk call as seen by [`RecordingBulk`].
#[derive(Debug, Clone)]
pub struct BulkCall {
    pub ids: Vec<String>,
    pub refresh: Refresh,
    pub at: Instant,
}

/// Records bulk calls; can fail a given call or mark items as failed.
pub struct RecordingBulk {
    pub calls: Mutex<Vec<BulkCall>>,
    fail_call: Option<usize>,
    item_errors: HashMap<String, (u16, &'static str)>,
}

impl RecordingBulk {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_call: None,
            item_errors: HashMap::new(),
        }
    }

    /// Fail the `n`th call (0-based) at the transport level.
    pub fn failing_call(mut self, n: usize) -> Self {
        self.fail_call = Some(n);
        self
    }

    /// Report the item with `id` as failed with the given status and type.
    pub fn item_error(
        mut self,
        id: impl Into<String>,
        status: u16,
        error_type: &'static str,
    ) -> Self {
        self.item_errors.insert(id.into(), (status, error_type));
        self
    }

    pub fn calls(&self) -> Vec<BulkCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkCapability for RecordingBulk {
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(BulkCall {
                ids: operations.iter().map(|op| op.id().to_string()).collect(),
                refresh,
                at: Instant::now(),
            });
            calls.len() - 1
        };

        if self.fail_call == Some(call) {
            return Err(OpenSearchError::Connection("connection reset by peer".to_string()));
        }

        let items = operations
            .iter()
            .map(|op| {
                let mut status = BulkItemStatus {
                    index: op.index_name().to_string(),
                    id: op.id().to_string(),
                    status: 201,
                    result: Some("created".to_string()),
                    ..Default::default()
                };
                if let Some((code, error_type)) = self.item_errors.get(op.id()) {
                    status.status = *code;
                    status.result = None;
                    status.error = Some(BulkItemError {
                        error_type: error_type.to_string(),
                        reason: format!("{} rejected", op.id()),
                    });
                }
                BulkItem::Create(status)
            })
            .collect::<Vec<_>>();

        Ok(BulkResponse {
            took: 1,
            errors: items.iter().any(|i| !i.status().is_success()),
            items,
        })
    }
}
