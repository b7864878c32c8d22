//! Handlers for the commands that work on downloaded data: `make-collection`,
//! `filter` and `verify`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use twcorpus_collection::{
    assemble_collection, filter_qrels_file, filter_run_file, inclusion_ids, verify_collection,
    AssembleRequest,
};

use crate::{FilterArgs, MakeCollectionArgs, VerifyArgs};

pub(crate) fn run_make_collection(args: &MakeCollectionArgs) -> anyhow::Result<ExitCode> {
    let references: Vec<&Path> = args.reference_doc_ids.iter().map(PathBuf::as_path).collect();
    let summary = assemble_collection(&AssembleRequest {
        downloaded_tweets: &args.downloaded_tweets,
        reference_doc_ids: &references,
        lang: &args.lang,
        output_file: &args.output_file,
        overwrite: args.overwrite,
    })?;
    println!(
        "created {} docs and expected {}",
        summary.created, summary.expected
    );
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_filter(args: &FilterArgs) -> anyhow::Result<ExitCode> {
    if args.runs.is_empty() && args.qrels.is_empty() {
        println!("nothing to filter");
        return Ok(ExitCode::SUCCESS);
    }

    let ids = inclusion_ids(&args.ids)?;
    println!("found {} docs", ids.len());

    for run in &args.runs {
        let summary = filter_run_file(run, &ids)?;
        println!(
            "{}: kept {} entries, dropped {}",
            run.display(),
            summary.kept,
            summary.removed
        );
    }
    for qrels in &args.qrels {
        let summary = filter_qrels_file(qrels, &ids)?;
        println!("drop {} entries from file {}", summary.removed, qrels.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_verify(args: &VerifyArgs) -> anyhow::Result<ExitCode> {
    let report = verify_collection(&args.doc_file, &args.id_files, args.early_stop)?;
    for issue in &report.issues {
        println!("[ERROR] {issue}");
    }
    println!("found {} errors.", report.issues.len());

    if report.stopped_early {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
