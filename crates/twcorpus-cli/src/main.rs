mod collection;
mod download;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use twcorpus_fetch::FetchError;

#[derive(Debug, Parser)]
#[command(name = "twcorpus")]
#[command(about = "Rebuild a tweet document collection from released identifiers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download posts for a list of identifiers, resuming from prior output
    Download(DownloadArgs),
    /// Assemble downloaded posts into collection documents
    MakeCollection(MakeCollectionArgs),
    /// Remove documents missing from the collection out of run and qrels files
    Filter(FilterArgs),
    /// Check a collection against the released checksums
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
struct DownloadArgs {
    /// File with one post identifier per line (gzip by suffix)
    #[arg(long)]
    tweetlist: PathBuf,
    /// JSONL output; appended to and read back on resume
    #[arg(long)]
    tweet_output: PathBuf,
    /// Write the raw post objects instead of normalized records
    #[arg(long)]
    raw_tweets: bool,
    /// Prior error logs whose identifiers are skipped
    #[arg(long, num_args = 1..)]
    error_input: Vec<PathBuf>,
    /// JSONL file that receives error entries
    #[arg(long)]
    error_output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MakeCollectionArgs {
    /// JSONL file of downloaded records
    #[arg(long)]
    downloaded_tweets: PathBuf,
    /// Released doc/tweet id files
    #[arg(long, required = true, num_args = 1..)]
    reference_doc_ids: Vec<PathBuf>,
    /// Language whose text forms the documents
    #[arg(long)]
    lang: String,
    #[arg(long, default_value = "docs.jsonl")]
    output_file: PathBuf,
    /// Replace an existing output file
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Text file with one document id per line, or the collection JSONL
    #[arg(long)]
    ids: PathBuf,
    /// Run files to filter
    #[arg(long, num_args = 1..)]
    runs: Vec<PathBuf>,
    /// Qrels files to filter
    #[arg(long, num_args = 1..)]
    qrels: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct VerifyArgs {
    /// Collection JSONL file
    #[arg(long)]
    doc_file: PathBuf,
    /// Released checksum files
    #[arg(long, required = true, num_args = 1..)]
    id_files: Vec<PathBuf>,
    /// Stop at the first problem
    #[arg(long)]
    early_stop: bool,
}

/// Exit status for a failed command: 2 for a malformed prior error log,
/// 1 for anything else.
fn failure_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<FetchError>() {
        Some(FetchError::MalformedErrorLog { .. }) => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(twcorpus_core::load_log_level()))
        .unwrap_or_else(|_| EnvFilter::new(twcorpus_core::config::DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Download(args) => download::run(&args).await,
        Commands::MakeCollection(args) => collection::run_make_collection(&args),
        Commands::Filter(args) => collection::run_filter(&args),
        Commands::Verify(args) => collection::run_verify(&args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(failure_code(&err))
        }
    }
}

#[cfg(test)]
mod tests;
