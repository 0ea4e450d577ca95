//! Paced, batched bulk writes.

use crate::{
    bulk::BulkOperation,
    capability::BulkCapability,
    config::BulkOptions,
    error::{CombinedError, Result},
    response::parse_bulk_response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Totals of one bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Items the engine applied, across all batches.
    pub succeeded: usize,
    /// Bulk requests actually sent.
    pub batches_sent: usize,
    /// Non-suppressed item failures, across all batches.
    pub errors: CombinedError,
}

impl BulkOutcome {
    /// True when no item failed (suppressed conflicts aside).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(succeeded)` when clean, otherwise the combined error.
    pub fn into_result(self) -> std::result::Result<usize, CombinedError> {
        let succeeded = self.succeeded;
        self.errors.into_result().map(|_| succeeded)
    }
}

/// Splits a position-addressed set of operations into paced bulk requests.
#[derive(Debug, Clone)]
pub struct BatchedBulkWriter<C> {
    bulk: C,
}

impl<C: BulkCapability> BatchedBulkWriter<C> {
    /// Create a writer over a bulk capability.
    pub fn new(bulk: C) -> Self {
        Self { bulk }
    }

    /// Write the operations for positions `0..total_count`.
    ///
    /// `operation_factory` is called exactly once per position, in order;
    /// `None` skips the position. Batches without any operation are not sent
    /// and do not count towards pacing.
    ///
    /// A transport failure returns `Err` immediately. Earlier batches may
    /// already be committed, so treat it as unknown completion state.
    /// Per-item failures never abort the run; they are collected in
    /// [`BulkOutcome::errors`].
    pub async fn run<F>(
        &self,
        total_count: usize,
        options: &BulkOptions,
        mut operation_factory: F,
    ) -> Result<BulkOutcome>
    where
        F: FnMut(usize) -> Option<BulkOperation>,
    {
        let mut outcome = BulkOutcome::default();
        if total_count == 0 {
            return Ok(outcome);
        }

        let limit = options.effective_batch_limit(total_count);
        let batches = total_count.div_ceil(limit);
        let started = Instant::now();

        for batch in 0..batches {
            let start = batch * limit;
            let end = (start + limit).min(total_count);
            let operations: Vec<BulkOperation> =
                (start..end).filter_map(&mut operation_factory).collect();

            if operations.is_empty() {
                debug!(batch, start, end, "Skipping empty bulk batch");
                continue;
            }

            if outcome.batches_sent > 0 {
                tokio::time::sleep(options.inter_batch_delay).await;
            }

            debug!(
                batch,
                operations = operations.len(),
                refresh = %options.refresh,
                "Sending bulk batch"
            );

            let response = self
                .bulk
                .bulk(&operations, options.refresh)
                .await
                .inspect_err(|e| warn!(batch, error = %e, "Bulk request failed, aborting run"))?;
            outcome.batches_sent += 1;

            let summary = parse_bulk_response(&response, options.ignore_version_conflicts);
            if !summary.errors.is_empty() {
                warn!(batch, failed = summary.errors.len(), "Bulk batch had item failures");
            }
            outcome.succeeded += summary.succeeded;
            outcome.errors.append(summary.errors);
        }

        info!(
            total_count,
            succeeded = outcome.succeeded,
            failed = outcome.errors.len(),
            batches = outcome.batches_sent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Bulk run finished"
        );

        Ok(outcome)
    }
}
