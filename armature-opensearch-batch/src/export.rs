//! Deep pagination with `search_after` cursors.
//!
//! The engine refuses `from + size` beyond its result window. Exports past
//! that window chain requests instead: every page asks for the hits after the
//! sort values of the previous page's last hit. This only works on fully
//! sorted results, so a hit without sort values aborts the export.

use crate::{
    capability::SearchCapability,
    config::ExportOptions,
    cursor::Cursor,
    error::{OpenSearchError, Result},
    search::{PageRequest, ResultSet},
};
use tracing::{debug, info};

/// Drives `search_after` exports against a search capability.
#[derive(Debug, Clone)]
pub struct PaginatedExporter<S> {
    search: S,
    options: ExportOptions,
}

impl<S: SearchCapability> PaginatedExporter<S> {
    /// Create an exporter with default options.
    pub fn new(search: S) -> Self {
        Self::with_options(search, ExportOptions::default())
    }

    /// Create an exporter with explicit options.
    pub fn with_options(search: S, options: ExportOptions) -> Self {
        Self { search, options }
    }

    /// The active options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Fetch every hit the factory's query matches, up to the hard cap.
    pub async fn export<F>(&self, factory: F) -> Result<ResultSet>
    where
        F: Fn() -> PageRequest,
    {
        export_with(&self.search, factory, self.options.page_size, self.options.hard_cap).await
    }

    /// Issue the factory's request once, without cursoring.
    pub async fn search_once<F>(&self, factory: F) -> Result<ResultSet>
    where
        F: Fn() -> PageRequest,
    {
        let page = self.search.search(&factory()).await?;
        let (meta, hits) = page.into_hits()?;
        Ok(ResultSet::first_page(meta, hits))
    }

    /// Export when `export` is set, otherwise run a single request.
    pub async fn search<F>(&self, factory: F, export: bool) -> Result<ResultSet>
    where
        F: Fn() -> PageRequest,
    {
        if export {
            self.export(factory).await
        } else {
            self.search_once(factory).await
        }
    }
}

/// Chain `search_after` pages until exhausted or `hard_cap` hits are collected.
///
/// Each page is requested with `from = 0` and `size = page_size`. Any error
/// aborts the export and no partial result is returned.
pub async fn export_with<S, F>(
    search: &S,
    factory: F,
    page_size: usize,
    hard_cap: usize,
) -> Result<ResultSet>
where
    S: SearchCapability + ?Sized,
    F: Fn() -> PageRequest,
{
    if page_size == 0 {
        return Err(OpenSearchError::Configuration("export page size must be positive".to_string()));
    }

    let mut cursor = Cursor::new();
    let mut results: Option<ResultSet> = None;

    loop {
        let request = factory().from(0).size(page_size as i64).search_after(cursor);
        debug!(
            indices = ?request.index_names(),
            page_size,
            cursor_len = request.cursor().map_or(0, |c| c.values().len()),
            "Requesting export page"
        );

        let page = search.search(&request).await?;
        let (meta, hits) = page.into_hits()?;
        let page_len = hits.len();

        // Sort values of the last hit of a full page seed the next request
        let next = if page_len >= page_size {
            hits.last().map(|last| (last.sort.clone(), last.index.clone(), last.id.clone()))
        } else {
            None
        };

        let collected = match results.as_mut() {
            Some(results) => {
                results.append_page(hits);
                results.len()
            }
            None => {
                let first = ResultSet::first_page(meta, hits);
                let len = first.len();
                results = Some(first);
                len
            }
        };

        if page_len < page_size || collected >= hard_cap {
            break;
        }

        let Some((sort, index, id)) = next else {
            break;
        };
        if sort.is_empty() {
            return Err(OpenSearchError::MissingSortValues { index, id });
        }
        cursor = Cursor::from(sort);
    }

    let results = results.unwrap_or_default();
    info!(hits = results.len(), pages = results.pages, "Export finished");
    Ok(results)
}
