//! Client, export, and bulk configuration.

use crate::error::{OpenSearchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// OpenSearch client configuration.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// OpenSearch URL(s). The client only contacts the first one.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl OpenSearchConfig {
    /// Create a new configuration with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration with multiple URLs for a cluster.
    ///
    /// The client sends every request to the first URL; the rest are kept for
    /// reference and reported in a warning when the client is built.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::new("")
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `OPENSEARCH_URL`: required, comma separated (only the first is contacted)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth
    /// - `OPENSEARCH_REQUEST_TIMEOUT`: request timeout in seconds
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let urls: Vec<String> = lookup("OPENSEARCH_URL")
            .ok_or_else(|| OpenSearchError::Configuration("OPENSEARCH_URL not set".into()))?
            .split(',')
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        let mut config = Self::cluster(urls);

        let user = lookup("OPENSEARCH_USERNAME");
        let pass = lookup("OPENSEARCH_PASSWORD");
        if let (Some(user), Some(pass)) = (user, pass) {
            config = config.with_basic_auth(user, pass);
        }

        if let Some(timeout) = lookup("OPENSEARCH_REQUEST_TIMEOUT") {
            let secs = parse_var("OPENSEARCH_REQUEST_TIMEOUT", &timeout)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The URL the client sends requests to.
    pub fn node_url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }
}

/// Options for deep `search_after` exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Hits requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Stop requesting pages once this many hits were collected.
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,
}

fn default_page_size() -> usize {
    1000
}

fn default_hard_cap() -> usize {
    500_000
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            hard_cap: default_hard_cap(),
        }
    }
}

impl ExportOptions {
    /// Create options with the default page size and hard cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from environment variables.
    ///
    /// - `OPENSEARCH_EXPORT_PAGE_SIZE` (default 1000)
    /// - `OPENSEARCH_EXPORT_HARD_CAP` (default 500000)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(size) = lookup("OPENSEARCH_EXPORT_PAGE_SIZE") {
            options.page_size = parse_var("OPENSEARCH_EXPORT_PAGE_SIZE", &size)?;
        }
        if let Some(cap) = lookup("OPENSEARCH_EXPORT_HARD_CAP") {
            options.hard_cap = parse_var("OPENSEARCH_EXPORT_HARD_CAP", &cap)?;
        }

        Ok(options)
    }

    /// Set the page size.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the hard cap.
    pub fn hard_cap(mut self, cap: usize) -> Self {
        self.hard_cap = cap;
        self
    }
}

/// Visibility refresh directive sent with each bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    /// Do not force a refresh.
    #[default]
    False,
    /// Refresh the affected shards immediately.
    True,
    /// Wait for the next scheduled refresh before responding.
    WaitFor,
}

impl Refresh {
    /// Value of the `refresh` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Refresh::False => "false",
            Refresh::True => "true",
            Refresh::WaitFor => "wait_for",
        }
    }
}

impl fmt::Display for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Refresh {
    type Err = OpenSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "false" | "" => Ok(Refresh::False),
            "true" => Ok(Refresh::True),
            "wait_for" => Ok(Refresh::WaitFor),
            other => Err(OpenSearchError::Configuration(format!(
                "Invalid refresh mode: {}",
                other
            ))),
        }
    }
}

/// Options for paced, batched bulk writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOptions {
    /// Operations per bulk request. Clamped to `[1, total]` at run time.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Pause before every batch after the first one sent.
    #[serde(default = "default_inter_batch_delay")]
    #[serde(rename = "inter_batch_delay_ms", with = "millis")]
    pub inter_batch_delay: Duration,

    /// Refresh directive passed through to the engine.
    #[serde(default)]
    pub refresh: Refresh,

    /// Treat `version_conflict_engine_exception` items as non-errors.
    #[serde(default)]
    pub ignore_version_conflicts: bool,
}

fn default_batch_limit() -> usize {
    1000
}

fn default_inter_batch_delay() -> Duration {
    Duration::from_secs(1)
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            inter_batch_delay: default_inter_batch_delay(),
            refresh: Refresh::default(),
            ignore_version_conflicts: false,
        }
    }
}

impl BulkOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from environment variables.
    ///
    /// - `OPENSEARCH_BULK_LIMIT` (default 1000)
    /// - `OPENSEARCH_BULK_DELAY_MS` (default 1000)
    /// - `OPENSEARCH_BULK_REFRESH`: `false`, `true` or `wait_for`
    /// - `OPENSEARCH_BULK_IGNORE_CONFLICTS`: `true` or `false`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(limit) = lookup("OPENSEARCH_BULK_LIMIT") {
            options.batch_limit = parse_var("OPENSEARCH_BULK_LIMIT", &limit)?;
        }
        if let Some(delay) = lookup("OPENSEARCH_BULK_DELAY_MS") {
            let millis = parse_var("OPENSEARCH_BULK_DELAY_MS", &delay)?;
            options.inter_batch_delay = Duration::from_millis(millis);
        }
        if let Some(refresh) = lookup("OPENSEARCH_BULK_REFRESH") {
            options.refresh = refresh.parse()?;
        }
        if let Some(ignore) = lookup("OPENSEARCH_BULK_IGNORE_CONFLICTS") {
            options.ignore_version_conflicts =
                parse_var("OPENSEARCH_BULK_IGNORE_CONFLICTS", &ignore)?;
        }

        Ok(options)
    }

    /// Set the number of operations per bulk request.
    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Set the pause between consecutive bulk requests.
    pub fn inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    /// Set the refresh directive.
    pub fn refresh(mut self, refresh: Refresh) -> Self {
        self.refresh = refresh;
        self
    }

    /// Suppress version conflicts in the combined error.
    pub fn ignore_version_conflicts(mut self, ignore: bool) -> Self {
        self.ignore_version_conflicts = ignore;
        self
    }

    /// Batch limit clamped to `[1, total]`.
    pub fn effective_batch_limit(&self, total: usize) -> usize {
        if self.batch_limit == 0 || self.batch_limit > total {
            total.max(1)
        } else {
            self.batch_limit
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| OpenSearchError::Configuration(format!("Invalid {}: {}", key, value)))
}

/// Serialize durations as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
