//! Bulk operations and bulk responses.

use crate::{document::Document, error::Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Kind of a bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Index a document (create or replace).
    Index,
    /// Create a document (fail if exists).
    Create,
    /// Partially update a document.
    Update,
    /// Delete a document.
    Delete,
}

impl BulkAction {
    /// Action name as used in the bulk NDJSON header line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Create => "create",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }
}

/// One write action inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    action: BulkAction,
    index: String,
    id: String,
    doc: Option<Value>,
    routing: Option<String>,
    version: Option<i64>,
}

impl BulkOperation {
    fn new(
        action: BulkAction,
        index: impl Into<String>,
        id: impl Into<String>,
        doc: Option<Value>,
    ) -> Self {
        Self {
            action,
            index: index.into(),
            id: id.into(),
            doc,
            routing: None,
            version: None,
        }
    }

    /// Index (create or replace) a raw JSON document.
    pub fn index(index: impl Into<String>, id: impl Into<String>, doc: Value) -> Self {
        Self::new(BulkAction::Index, index, id, Some(doc))
    }

    /// Create a raw JSON document, failing if it already exists.
    pub fn create(index: impl Into<String>, id: impl Into<String>, doc: Value) -> Self {
        Self::new(BulkAction::Create, index, id, Some(doc))
    }

    /// Partially update a document with a raw JSON fragment.
    pub fn update(index: impl Into<String>, id: impl Into<String>, partial: Value) -> Self {
        Self::new(BulkAction::Update, index, id, Some(partial))
    }

    /// Delete a document.
    pub fn delete(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(BulkAction::Delete, index, id, None)
    }

    /// Index a typed document into its default index.
    pub fn index_document<T: Document>(id: impl Into<String>, doc: &T) -> Result<Self> {
        Ok(Self::index(T::index_name(), id, serde_json::to_value(doc)?).with_document_routing(doc))
    }

    /// Create a typed document in its default index.
    pub fn create_document<T: Document>(id: impl Into<String>, doc: &T) -> Result<Self> {
        Ok(Self::create(T::index_name(), id, serde_json::to_value(doc)?).with_document_routing(doc))
    }

    /// Update a typed document in its default index.
    pub fn update_document<T: Document>(id: impl Into<String>, doc: &T) -> Result<Self> {
        Ok(Self::update(T::index_name(), id, serde_json::to_value(doc)?).with_document_routing(doc))
    }

    /// Delete a document from `T`'s default index.
    pub fn delete_document<T: Document>(id: impl Into<String>) -> Self {
        Self::delete(T::index_name(), id)
    }

    fn with_document_routing<T: Document>(mut self, doc: &T) -> Self {
        self.routing = doc.routing();
        self
    }

    /// Set the routing key.
    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// Use external versioning with the given version.
    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// The action kind.
    pub fn action(&self) -> BulkAction {
        self.action
    }

    /// Target index.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Target document ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Convert to bulk request lines.
    pub fn to_bulk_lines(&self) -> Vec<Value> {
        let mut meta = json!({ "_index": self.index, "_id": self.id });
        if let Some(routing) = &self.routing {
            meta["routing"] = json!(routing);
        }
        if let Some(version) = self.version {
            meta["version"] = json!(version);
            meta["version_type"] = json!("external");
        }

        let header = json!({ self.action.as_str(): meta });

        match (&self.action, &self.doc) {
            (BulkAction::Update, Some(doc)) => vec![header, json!({ "doc": doc })],
            (BulkAction::Delete, _) | (_, None) => vec![header],
            (_, Some(doc)) => vec![header, doc.clone()],
        }
    }
}

/// Bulk operation response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Time taken in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether there were errors.
    #[serde(default)]
    pub errors: bool,
    /// Individual item results.
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    /// Items the engine did not apply.
    pub fn failed(&self) -> impl Iterator<Item = &BulkItemStatus> {
        self.items.iter().map(BulkItem::status).filter(|s| !s.is_success())
    }

    /// Items the engine applied.
    pub fn succeeded(&self) -> impl Iterator<Item = &BulkItemStatus> {
        self.items.iter().map(BulkItem::status).filter(|s| s.is_success())
    }
}

/// Individual bulk item result, keyed by action name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkItem {
    /// Index result.
    Index(BulkItemStatus),
    /// Create result.
    Create(BulkItemStatus),
    /// Update result.
    Update(BulkItemStatus),
    /// Delete result.
    Delete(BulkItemStatus),
}

impl BulkItem {
    /// The action this item reports on.
    pub fn action(&self) -> BulkAction {
        match self {
            BulkItem::Index(_) => BulkAction::Index,
            BulkItem::Create(_) => BulkAction::Create,
            BulkItem::Update(_) => BulkAction::Update,
            BulkItem::Delete(_) => BulkAction::Delete,
        }
    }

    /// The item status.
    pub fn status(&self) -> &BulkItemStatus {
        match self {
            BulkItem::Index(s)
            | BulkItem::Create(s)
            | BulkItem::Update(s)
            | BulkItem::Delete(s) => s,
        }
    }
}

/// Status of a bulk item operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkItemStatus {
    /// Index name.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document ID.
    #[serde(rename = "_id", default, deserialize_with = "null_as_empty")]
    pub id: String,
    /// Document version.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// Result status.
    #[serde(default)]
    pub result: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Error details.
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Bulk item error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error reason; empty when the engine reports none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl BulkItemStatus {
    /// Check if the operation was successful.
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
