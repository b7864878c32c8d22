use std::path::PathBuf;

use super::*;

#[test]
fn parses_download_with_repeated_error_inputs() {
    let cli = Cli::try_parse_from([
        "twcorpus",
        "download",
        "--tweetlist",
        "ids.txt",
        "--tweet-output",
        "out/tweets.jsonl",
        "--error-input",
        "a.jsonl",
        "--error-input",
        "b.jsonl",
        "--error-output",
        "errors.jsonl",
    ])
    .expect("expected valid cli args");

    let Commands::Download(args) = cli.command else {
        panic!("expected download command");
    };
    assert_eq!(args.tweetlist, PathBuf::from("ids.txt"));
    assert_eq!(
        args.error_input,
        vec![PathBuf::from("a.jsonl"), PathBuf::from("b.jsonl")]
    );
    assert_eq!(args.error_output, Some(PathBuf::from("errors.jsonl")));
    assert!(!args.raw_tweets);
}

#[test]
fn download_takes_several_error_inputs_after_one_flag() {
    let cli = Cli::try_parse_from([
        "twcorpus",
        "download",
        "--tweetlist",
        "ids.txt",
        "--tweet-output",
        "o.jsonl",
        "--error-input",
        "a.jsonl",
        "b.jsonl",
        "--raw-tweets",
    ])
    .unwrap();

    let Commands::Download(args) = cli.command else {
        panic!("expected download command");
    };
    assert_eq!(
        args.error_input,
        vec![PathBuf::from("a.jsonl"), PathBuf::from("b.jsonl")]
    );
    assert!(args.raw_tweets);
}

#[test]
fn download_requires_tweetlist_and_output() {
    assert!(Cli::try_parse_from(["twcorpus", "download", "--tweetlist", "ids.txt"]).is_err());
    assert!(Cli::try_parse_from(["twcorpus", "download", "--tweet-output", "o.jsonl"]).is_err());
}

#[test]
fn download_error_files_are_optional() {
    let cli = Cli::try_parse_from([
        "twcorpus",
        "download",
        "--tweetlist",
        "ids.txt",
        "--tweet-output",
        "o.jsonl",
        "--raw-tweets",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Download(DownloadArgs {
            raw_tweets: true,
            error_output: None,
            ref error_input,
            ..
        }) if error_input.is_empty()
    ));
}

#[test]
fn make_collection_defaults_output_file() {
    let cli = Cli::try_parse_from([
        "twcorpus",
        "make-collection",
        "--downloaded-tweets",
        "tweets.jsonl",
        "--reference-doc-ids",
        "a.jsonl.gz",
        "b.jsonl.gz",
        "--lang",
        "fa",
    ])
    .unwrap();

    let Commands::MakeCollection(args) = cli.command else {
        panic!("expected make-collection command");
    };
    assert_eq!(args.reference_doc_ids.len(), 2);
    assert_eq!(args.output_file, PathBuf::from("docs.jsonl"));
    assert!(!args.overwrite);
}

#[test]
fn filter_accepts_runs_without_qrels() {
    let cli = Cli::try_parse_from([
        "twcorpus", "filter", "--ids", "docs.jsonl", "--runs", "a.run", "b.run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Filter(FilterArgs { ref runs, ref qrels, .. })
            if runs.len() == 2 && qrels.is_empty()
    ));
}

#[test]
fn verify_parses_early_stop() {
    let cli = Cli::try_parse_from([
        "twcorpus",
        "verify",
        "--doc-file",
        "docs.jsonl",
        "--id-files",
        "ids.jsonl.gz",
        "--early-stop",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Verify(VerifyArgs {
            early_stop: true,
            ..
        })
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["twcorpus"]).is_err());
}

#[test]
fn malformed_error_log_exits_with_code_two() {
    let err = anyhow::Error::from(FetchError::MalformedErrorLog {
        path: "errors.jsonl".to_string(),
        line: 3,
        reason: "missing `value` field".to_string(),
    });
    assert_eq!(failure_code(&err), 2);
    assert_eq!(
        failure_code(&anyhow::Error::from(FetchError::NothingToProcess)),
        1
    );
}
