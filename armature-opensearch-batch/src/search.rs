//! Page requests, hits, and accumulated result sets.

use crate::{
    cursor::Cursor,
    error::{OpenSearchError, Result},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Immutable description of one search request.
///
/// Callers hand the exporter a factory producing a fresh `PageRequest`
/// for every page; the exporter overrides `from`, `size` and `search_after`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    indices: Vec<String>,
    query: Option<Value>,
    from: Option<i64>,
    size: Option<i64>,
    sort: Vec<Value>,
    search_after: Option<Cursor>,
    source_includes: Option<Vec<String>>,
    source_excludes: Option<Vec<String>>,
    track_total_hits: Option<bool>,
}

impl PageRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index to search.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.indices.push(index.into());
        self
    }

    /// Set multiple indices to search.
    pub fn indices(mut self, indices: Vec<String>) -> Self {
        self.indices = indices;
        self
    }

    /// Set a raw JSON query.
    pub fn query_json(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Term filter on a single field.
    pub fn term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut term = serde_json::Map::new();
        term.insert(field.into(), value.into());
        self.query_json(json!({ "term": term }))
    }

    /// Set pagination offset.
    pub fn from(mut self, from: i64) -> Self {
        self.from = Some(from);
        self
    }

    /// Set result size limit.
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Add sort field.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        let mut sort = serde_json::Map::new();
        sort.insert(field.into(), json!({ "order": order.as_str() }));
        self.sort.push(Value::Object(sort));
        self
    }

    /// Continue after the given sort values. An empty cursor clears it.
    pub fn search_after(mut self, cursor: Cursor) -> Self {
        self.search_after = if cursor.is_empty() { None } else { Some(cursor) };
        self
    }

    /// Include only specific fields in the response.
    pub fn source_includes(mut self, fields: Vec<String>) -> Self {
        self.source_includes = Some(fields);
        self
    }

    /// Exclude specific fields from the response.
    pub fn source_excludes(mut self, fields: Vec<String>) -> Self {
        self.source_excludes = Some(fields);
        self
    }

    /// Track total hits accurately (for counts > 10000).
    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = Some(track);
        self
    }

    /// Indices this request targets.
    pub fn index_names(&self) -> &[String] {
        &self.indices
    }

    /// Requested offset, if any.
    pub fn requested_from(&self) -> Option<i64> {
        self.from
    }

    /// Requested page size, if any.
    pub fn requested_size(&self) -> Option<i64> {
        self.size
    }

    /// Attached `search_after` cursor, if any.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.search_after.as_ref()
    }

    /// Build the JSON search body.
    pub fn to_body(&self) -> Value {
        let mut body = serde_json::Map::new();

        if let Some(query) = &self.query {
            body.insert("query".to_string(), query.clone());
        }

        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }

        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }

        if !self.sort.is_empty() {
            body.insert("sort".to_string(), Value::Array(self.sort.clone()));
        }

        if let Some(cursor) = &self.search_after {
            body.insert("search_after".to_string(), json!(cursor.values()));
        }

        // Source filtering
        let mut source = serde_json::Map::new();
        if let Some(includes) = &self.source_includes {
            source.insert("includes".to_string(), json!(includes));
        }
        if let Some(excludes) = &self.source_excludes {
            source.insert("excludes".to_string(), json!(excludes));
        }
        if !source.is_empty() {
            body.insert("_source".to_string(), Value::Object(source));
        }

        if let Some(track) = self.track_total_hits {
            body.insert("track_total_hits".to_string(), json!(track));
        }

        Value::Object(body)
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document ID.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Index name.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Relevance score; absent when sorting by field only.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Routing value.
    #[serde(rename = "_routing", default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    /// Document source.
    #[serde(rename = "_source", default)]
    pub source: Value,
    /// Sort values; the `search_after` cursor for the next page.
    #[serde(default)]
    pub sort: Vec<Value>,
    /// Highlighted fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HashMap<String, Vec<String>>>,
}

impl Hit {
    /// Decode the source into a typed document.
    pub fn document<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.source.clone())?)
    }
}

/// One page returned by a search capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Total matching documents.
    pub total: u64,
    /// Total relation ("eq" or "gte").
    pub total_relation: String,
    /// Maximum score.
    pub max_score: Option<f64>,
    /// Hits; `None` when the response carried no hits section.
    pub hits: Option<Vec<Hit>>,
    /// Time taken in milliseconds.
    pub took_ms: u64,
}

impl SearchPage {
    /// Page with the given hits and a matching total.
    pub fn with_hits(hits: Vec<Hit>) -> Self {
        Self {
            total: hits.len() as u64,
            total_relation: "eq".to_string(),
            hits: Some(hits),
            ..Default::default()
        }
    }

    /// Parse a raw `_search` response body.
    pub fn from_response(result: &Value) -> Result<Self> {
        let hits = match result["hits"]["hits"].as_array() {
            Some(arr) => Some(
                arr.iter()
                    .map(|hit| serde_json::from_value::<Hit>(hit.clone()))
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        // `hits.total` is an object on 7.x+ and a bare number before that
        let total_field = &result["hits"]["total"];
        let total = total_field["value"]
            .as_u64()
            .or_else(|| total_field.as_u64())
            .unwrap_or(0);
        let total_relation = total_field["relation"]
            .as_str()
            .unwrap_or("eq")
            .to_string();

        Ok(Self {
            total,
            total_relation,
            max_score: result["hits"]["max_score"].as_f64(),
            hits,
            took_ms: result["took"].as_u64().unwrap_or(0),
        })
    }

    pub(crate) fn into_hits(self) -> Result<(PageMeta, Vec<Hit>)> {
        let hits = self.hits.ok_or_else(|| {
            OpenSearchError::MalformedResponse("search response has no hits".to_string())
        })?;
        let meta = PageMeta {
            total: self.total,
            total_relation: self.total_relation,
            max_score: self.max_score,
            took_ms: self.took_ms,
        };
        Ok((meta, hits))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PageMeta {
    total: u64,
    total_relation: String,
    max_score: Option<f64>,
    took_ms: u64,
}

/// Hits accumulated over one or more pages, in arrival order.
///
/// Metadata (total, max score, took) comes from the first page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Total matching documents reported by the first page.
    pub total: u64,
    /// Total relation ("eq" or "gte").
    pub total_relation: String,
    /// Maximum score reported by the first page.
    pub max_score: Option<f64>,
    /// Time the first page took, in milliseconds.
    pub took_ms: u64,
    /// Number of pages fetched.
    pub pages: usize,
    hits: Vec<Hit>,
}

impl ResultSet {
    pub(crate) fn first_page(meta: PageMeta, hits: Vec<Hit>) -> Self {
        Self {
            total: meta.total,
            total_relation: meta.total_relation,
            max_score: meta.max_score,
            took_ms: meta.took_ms,
            pages: 1,
            hits,
        }
    }

    pub(crate) fn append_page(&mut self, hits: Vec<Hit>) {
        self.pages += 1;
        self.hits.extend(hits);
    }

    /// Number of accumulated hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when no hits were returned.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Accumulated hits.
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Consume the result set, returning its hits.
    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }

    /// Decode every hit's source into a typed document.
    pub fn documents<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.hits.iter().map(Hit::document).collect()
    }
}
