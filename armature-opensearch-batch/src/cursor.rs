//! `search_after` cursors and sort value helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort values of the last hit of a page, used to request the page after it.
///
/// The exporter never looks inside a cursor; it only attaches it to the next
/// request. An empty cursor means "first page".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Vec<Value>);

impl Cursor {
    /// Create an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first page.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sort values.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Consume the cursor, returning its sort values.
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Cursor {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl From<&[String]> for Cursor {
    fn from(values: &[String]) -> Self {
        Self(strings_to_sort_values(values))
    }
}

impl From<&[i64]> for Cursor {
    fn from(values: &[i64]) -> Self {
        Self(i64s_to_sort_values(values))
    }
}

/// Convert strings into sort values usable as cursor components.
pub fn strings_to_sort_values<S: AsRef<str>>(values: &[S]) -> Vec<Value> {
    values
        .iter()
        .map(|v| Value::String(v.as_ref().to_string()))
        .collect()
}

/// Convert 64-bit integers into sort values usable as cursor components.
pub fn i64s_to_sort_values(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}
