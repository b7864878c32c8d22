//! Rate-limited batch download of posts by identifier.
//!
//! Identifiers are filtered against a [`Ledger`] of prior work, grouped into
//! [`Batch`]es of up to 100, resolved one at a time through a
//! [`BatchResolver`] under the [`Backoff`] state machine, and the responses
//! are partitioned into record and error JSONL outputs.

pub mod backoff;
pub mod batch;
pub mod client;
pub mod error;
pub mod ledger;
pub mod normalize;
pub mod partition;
pub mod run;
pub mod sink;
pub mod types;

pub use backoff::{AbortReason, Backoff, BackoffPolicy, BatchOutcome};
pub use batch::{batches, Batch, MAX_BATCH_SIZE};
pub use client::{BatchResolver, TweetClient};
pub use error::FetchError;
pub use ledger::{read_identifiers, Ledger};
pub use normalize::{normalize_tweet, Record};
pub use partition::{partition, OutputMode, OutputRecord, Partition};
pub use run::{run_download, Outputs, RunOptions, RunOutcome, RunSummary};
pub use sink::{JsonlFileSink, LineSink};
pub use types::{LookupOutcome, LookupResponse};
