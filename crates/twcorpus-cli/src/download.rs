//! `download` command handler.
//!
//! Seeds the ledger from prior error logs and the existing output, then runs
//! the batch download with append-only sinks. Cold-start aborts and exhausted
//! retries are intentional stops and exit 0 so a scheduler can rerun later.

use std::process::ExitCode;

use twcorpus_fetch::{
    read_identifiers, run_download, BackoffPolicy, JsonlFileSink, Ledger, LineSink, OutputMode,
    Outputs, RunOptions, RunOutcome, TweetClient,
};

use crate::DownloadArgs;

pub(crate) async fn run(args: &DownloadArgs) -> anyhow::Result<ExitCode> {
    let config = twcorpus_core::load_fetch_config()?;

    let mut ledger = Ledger::new();
    ledger.absorb_error_log_files(&args.error_input)?;
    ledger.absorb_output_file(&args.tweet_output)?;
    tracing::info!(resolved = ledger.len(), "ledger seeded");

    let ids = read_identifiers(&args.tweetlist)?;
    let pending = ledger.pending(ids)?;

    let client = TweetClient::new(&config)?;
    let mut records = JsonlFileSink::open_append(&args.tweet_output)?;
    let mut errors = args
        .error_output
        .as_deref()
        .map(JsonlFileSink::open_append)
        .transpose()?;

    let options = RunOptions {
        policy: BackoffPolicy::from_config(&config),
        mode: if args.raw_tweets {
            OutputMode::Raw
        } else {
            OutputMode::Normalized
        },
        ..RunOptions::default()
    };
    let outputs = Outputs {
        records: &mut records,
        errors: errors.as_mut().map(|sink| sink as &mut dyn LineSink),
    };

    let summary = run_download(&client, pending, &mut ledger, outputs, options).await?;

    match summary.outcome {
        RunOutcome::Completed => tracing::info!(
            batches = summary.batches_completed,
            records = summary.records_written,
            errors = summary.errors_written,
            dropped = summary.records_dropped,
            "download complete"
        ),
        RunOutcome::ColdStartAbort => tracing::warn!(
            remaining = summary.identifiers_remaining,
            "first request was rate limited; stopping early"
        ),
        RunOutcome::RetriesExhausted => tracing::warn!(
            batches = summary.batches_completed,
            remaining = summary.identifiers_remaining,
            "retries exhausted; stopping early"
        ),
    }
    Ok(ExitCode::SUCCESS)
}
