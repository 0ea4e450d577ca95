//! Classification of bulk responses into successes and failures.

use crate::{
    bulk::BulkResponse,
    error::{CombinedError, ItemFailure, VERSION_CONFLICT},
};

/// Outcome of one parsed bulk response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Items the engine applied.
    pub succeeded: usize,
    /// Failures that were not suppressed.
    pub errors: CombinedError,
}

/// Classify a bulk response.
///
/// When any item failed, the success count is `items - failed`. Suppressed
/// version conflicts are still subtracted; they are only left out of `errors`.
/// Failed items without an error object count as failed but add no cause.
pub fn parse_bulk_response(response: &BulkResponse, ignore_conflicts: bool) -> BulkSummary {
    let failed: Vec<_> = response.failed().collect();

    if failed.is_empty() {
        return BulkSummary {
            succeeded: response.succeeded().count(),
            errors: CombinedError::new(),
        };
    }

    let mut errors = CombinedError::new();
    for item in &failed {
        let Some(error) = &item.error else {
            continue;
        };
        if ignore_conflicts && error.error_type == VERSION_CONFLICT {
            continue;
        }
        errors.push(ItemFailure {
            index: item.index.clone(),
            id: item.id.clone(),
            status: item.status,
            error_type: error.error_type.clone(),
            reason: error.reason.clone(),
        });
    }

    BulkSummary {
        succeeded: response.items.len() - failed.len(),
        errors,
    }
}

/// Classify a bulk response, reporting every failure.
pub fn parse_bulk_response_strict(response: &BulkResponse) -> BulkSummary {
    parse_bulk_response(response, false)
}

/// Classify a bulk response, suppressing version conflicts.
pub fn parse_bulk_response_ignore_conflicts(response: &BulkResponse) -> BulkSummary {
    parse_bulk_response(response, true)
}
