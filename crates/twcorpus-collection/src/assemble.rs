//! Assembles downloaded records into collection documents.
//!
//! Each reference document lists `(language, tweet id)` pairs. A document is
//! emitted only when every pair in the target language was downloaded; other
//! languages are carried along when present and tolerated when missing.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollectionError;
use crate::lookup::JsonlLookup;

/// One line of a reference-doc-id file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceDoc {
    pub doc_id: String,
    pub tweet_ids: Vec<(String, String)>,
}

/// One line of the assembled collection. Field order is the output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionDoc {
    pub id: String,
    pub title: String,
    pub text: String,
    pub tweets: Vec<Value>,
    pub numtweets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssembleSummary {
    pub created: usize,
    pub expected: usize,
}

/// Inputs for [`assemble_collection`].
#[derive(Debug, Clone, Copy)]
pub struct AssembleRequest<'a> {
    pub downloaded_tweets: &'a Path,
    pub reference_doc_ids: &'a [&'a Path],
    pub lang: &'a str,
    pub output_file: &'a Path,
    pub overwrite: bool,
}

fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_of(record: &Value) -> String {
    match record.get("text") {
        Some(Value::String(s)) => clean(s),
        Some(Value::Null) | None => String::new(),
        Some(other) => clean(&other.to_string()),
    }
}

/// Builds one document, or `None` when a target-language post is missing.
///
/// # Errors
///
/// Propagates lookup read failures.
pub fn build_document(
    reference: &ReferenceDoc,
    tweets: &mut JsonlLookup,
    lang: &str,
) -> Result<Option<CollectionDoc>, CollectionError> {
    let mut text = String::new();
    let mut collected = Vec::new();
    let mut numtweets = 0;

    for (ask_lang, ask_id) in &reference.tweet_ids {
        match tweets.get(ask_id)? {
            None if ask_lang == lang => {
                tracing::debug!(
                    doc_id = %reference.doc_id,
                    tweet_id = %ask_id,
                    "missing post; discarding document"
                );
                return Ok(None);
            }
            None => {}
            Some(mut record) => {
                let is_target = ask_lang == lang;
                if is_target {
                    numtweets += 1;
                    text.push_str(&text_of(&record));
                }
                if let Some(obj) = record.as_object_mut() {
                    obj.insert("lang".to_owned(), Value::String(ask_lang.clone()));
                    if is_target {
                        obj.insert("text".to_owned(), Value::String(String::new()));
                    }
                }
                collected.push(record);
            }
        }
        text.push('\n');
    }

    Ok(Some(CollectionDoc {
        id: reference.doc_id.clone(),
        title: String::new(),
        text,
        tweets: collected,
        numtweets,
    }))
}

/// Writes the collection for `request.lang` to `request.output_file`.
///
/// # Errors
///
/// Returns [`CollectionError::OutputExists`] when the output exists and
/// `overwrite` is false, and propagates read, parse and write failures.
pub fn assemble_collection(
    request: &AssembleRequest<'_>,
) -> Result<AssembleSummary, CollectionError> {
    let output = request.output_file.display().to_string();
    if request.output_file.exists() && !request.overwrite {
        return Err(CollectionError::OutputExists(output));
    }

    let mut tweets = JsonlLookup::open(request.downloaded_tweets, "tweetid")?;
    let file = File::create(request.output_file).map_err(|e| CollectionError::io(&output, e))?;
    let mut writer = BufWriter::new(file);
    let mut summary = AssembleSummary::default();

    for path in request.reference_doc_ids {
        let shown = path.display().to_string();
        let reader =
            twcorpus_core::io::open_lines(path).map_err(|e| CollectionError::io(&shown, e))?;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CollectionError::io(&shown, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let reference: ReferenceDoc = serde_json::from_str(&line).map_err(|e| {
                CollectionError::deserialize(format!("{shown} line {}", idx + 1), e)
            })?;

            if let Some(doc) = build_document(&reference, &mut tweets, request.lang)? {
                serde_json::to_writer(&mut writer, &doc)?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| CollectionError::io(&output, e))?;
                summary.created += 1;
            }
            summary.expected += 1;
        }
    }
    writer.flush().map_err(|e| CollectionError::io(&output, e))?;

    tracing::info!(
        created = summary.created,
        expected = summary.expected,
        "collection assembled"
    );
    Ok(summary)
}
