//! Run driver: batches the pending identifiers, resolves each batch under the
//! backoff policy and appends the partitioned results.

use crate::backoff::{AbortReason, Backoff, BackoffPolicy, BatchOutcome};
use crate::batch::{batches, MAX_BATCH_SIZE};
use crate::client::BatchResolver;
use crate::error::FetchError;
use crate::ledger::Ledger;
use crate::partition::{partition, OutputMode};
use crate::sink::LineSink;

/// Trailing pending identifiers written to the error output on a cold-start
/// abort.
pub const COLD_START_FLUSH: usize = 10;

/// Output streams for a run. Without an error sink, error entries are only
/// counted.
pub struct Outputs<'a> {
    pub records: &'a mut dyn LineSink,
    pub errors: Option<&'a mut dyn LineSink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The first request was rate limited; nothing was fetched.
    ColdStartAbort,
    /// A batch used every attempt; later identifiers are left for another run.
    RetriesExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub batches_completed: usize,
    pub records_written: usize,
    pub errors_written: usize,
    pub records_dropped: usize,
    /// Identifiers never answered in this run.
    pub identifiers_remaining: usize,
}

/// Settings for [`run_download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub policy: BackoffPolicy,
    pub mode: OutputMode,
    pub batch_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: BackoffPolicy::default(),
            mode: OutputMode::Normalized,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Fetches every identifier in `pending`, one batch in flight at a time.
///
/// Each successful batch is partitioned, folded into `ledger` and appended to
/// `outputs` before the next one starts, followed by a `default_wait` rest.
///
/// # Errors
///
/// Returns the first fatal error: an unexpected status or network failure
/// from `resolver`, or an output write failure. Batches already written stay
/// on disk.
///
/// # Panics
///
/// Panics if `options.batch_size` is outside `1..=100`.
pub async fn run_download<R: BatchResolver>(
    resolver: &R,
    pending: Vec<String>,
    ledger: &mut Ledger,
    mut outputs: Outputs<'_>,
    options: RunOptions,
) -> Result<RunSummary, FetchError> {
    let total = pending.len();
    let tail = pending[total.saturating_sub(COLD_START_FLUSH)..].to_vec();
    tracing::info!(count = total, "identifiers to process");

    let mut backoff = Backoff::new(options.policy);
    let mut summary = RunSummary {
        outcome: RunOutcome::Completed,
        batches_completed: 0,
        records_written: 0,
        errors_written: 0,
        records_dropped: 0,
        identifiers_remaining: total,
    };

    for batch in batches(pending, options.batch_size) {
        tracing::info!(
            size = batch.len(),
            last_id = batch.last_id(),
            "processing next batch"
        );

        let response = match backoff.resolve(resolver, &batch).await? {
            BatchOutcome::Succeeded { response, .. } => response,
            BatchOutcome::Aborted(AbortReason::ColdStart) => {
                match outputs.errors.as_deref_mut() {
                    Some(errors) => flush_cold_start(&tail, errors)?,
                    None => tracing::warn!(
                        "no error output configured; pending identifiers not flushed"
                    ),
                }
                summary.outcome = RunOutcome::ColdStartAbort;
                return Ok(summary);
            }
            BatchOutcome::Aborted(AbortReason::Exhausted { .. }) => {
                summary.outcome = RunOutcome::RetriesExhausted;
                return Ok(summary);
            }
        };

        let part = partition(response, ledger, options.mode);

        if let Some(errors) = outputs.errors.as_deref_mut() {
            let lines = part
                .errors
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            errors.append(&lines)?;
            summary.errors_written += lines.len();
        }

        let lines = part
            .records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        outputs.records.append(&lines)?;

        summary.records_written += lines.len();
        summary.records_dropped += part.dropped_records;
        summary.batches_completed += 1;
        summary.identifiers_remaining -= batch.len();

        tokio::time::sleep(backoff.policy().default_wait).await;
    }

    Ok(summary)
}

/// Writes the pending tail as bare JSON strings. Those lines carry no `value`
/// field, so feeding this error log back in stops the next run with exit
/// code 2 until an operator clears it.
fn flush_cold_start(tail: &[String], sink: &mut dyn LineSink) -> Result<(), FetchError> {
    let lines = tail
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    sink.append(&lines)
}
