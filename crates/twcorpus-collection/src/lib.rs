//! Collection tools that run after a download: document assembly, run and
//! qrels filtering, and checksum verification.

pub mod assemble;
pub mod error;
pub mod filter;
pub mod lookup;
pub mod verify;

pub use assemble::{assemble_collection, AssembleRequest, AssembleSummary, CollectionDoc};
pub use error::CollectionError;
pub use filter::{filter_qrels_file, filter_run_file, inclusion_ids, FilterSummary};
pub use lookup::JsonlLookup;
pub use verify::{verify_collection, VerifyIssue, VerifyReport};
