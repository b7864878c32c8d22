//! Drops documents that are no longer in the collection from TREC run and
//! qrels files.
//!
//! Filtered copies are written next to the inputs with a `.filtered` suffix.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CollectionError;

/// Entries kept and removed by one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterSummary {
    pub kept: usize,
    pub removed: usize,
}

/// Reads the set of document ids to keep.
///
/// A file whose first line starts with `{` is read as JSONL with ids under
/// `id`; anything else is one id per line. Gzip is detected by suffix.
///
/// # Errors
///
/// Returns [`CollectionError::Io`] on read failure and
/// [`CollectionError::Deserialize`] / [`CollectionError::MissingKey`] for a
/// bad JSONL line.
pub fn inclusion_ids(path: &Path) -> Result<HashSet<String>, CollectionError> {
    let shown = path.display().to_string();
    let first =
        twcorpus_core::io::first_line(path).map_err(|e| CollectionError::io(&shown, e))?;
    let is_jsonl = first.starts_with('{');
    let reader =
        twcorpus_core::io::open_lines(path).map_err(|e| CollectionError::io(&shown, e))?;

    let mut ids = HashSet::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CollectionError::io(&shown, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_jsonl {
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                CollectionError::deserialize(format!("{shown} line {}", idx + 1), e)
            })?;
            let id = value.get("id").and_then(Value::as_str).ok_or_else(|| {
                CollectionError::MissingKey {
                    path: shown.clone(),
                    line: idx + 1,
                    key: "id".to_owned(),
                }
            })?;
            ids.insert(id.to_owned());
        } else {
            ids.insert(trimmed.to_owned());
        }
    }

    tracing::info!(path = %shown, count = ids.len(), "inclusion ids loaded");
    Ok(ids)
}

/// `<path>.filtered`
#[must_use]
pub fn filtered_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".filtered");
    PathBuf::from(name)
}

#[derive(Debug, Clone, PartialEq)]
struct RunEntry {
    q0: String,
    doc_id: String,
    score: f64,
    score_text: String,
    run_name: String,
}

fn parse_run_line(
    line: &str,
    source: &str,
    line_no: usize,
) -> Result<(String, RunEntry), CollectionError> {
    let malformed = |reason: String| CollectionError::MalformedRun {
        path: source.to_owned(),
        line: line_no,
        reason,
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[topic, q0, doc_id, rank, score, run_name] = fields.as_slice() else {
        return Err(malformed(format!("expected 6 fields, found {}", fields.len())));
    };
    rank.parse::<i64>()
        .map_err(|e| malformed(format!("rank `{rank}`: {e}")))?;
    let score_value = score
        .parse::<f64>()
        .map_err(|e| malformed(format!("score `{score}`: {e}")))?;

    Ok((
        topic.to_owned(),
        RunEntry {
            q0: q0.to_owned(),
            doc_id: doc_id.to_owned(),
            score: score_value,
            score_text: score.to_owned(),
            run_name: run_name.to_owned(),
        },
    ))
}

/// Filters one run. Topics keep their first-seen order; within a topic the
/// surviving entries are ordered by descending score and re-ranked from 0.
///
/// # Errors
///
/// Returns [`CollectionError::MalformedRun`] for a line that is not a run
/// entry and [`CollectionError::Io`] on read or write failure.
pub fn filter_run<R: BufRead, W: Write>(
    reader: R,
    source: &str,
    ids: &HashSet<String>,
    mut out: W,
) -> Result<FilterSummary, CollectionError> {
    let mut order: Vec<String> = Vec::new();
    let mut topics: HashMap<String, Vec<RunEntry>> = HashMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CollectionError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let (topic, entry) = parse_run_line(&line, source, idx + 1)?;
        topics
            .entry(topic.clone())
            .or_insert_with(|| {
                order.push(topic);
                Vec::new()
            })
            .push(entry);
    }

    let mut summary = FilterSummary::default();
    for topic in &order {
        let entries = topics.remove(topic).unwrap_or_default();
        let total = entries.len();
        let mut kept: Vec<RunEntry> = entries
            .into_iter()
            .filter(|e| ids.contains(&e.doc_id))
            .collect();
        // Ties come out in reverse input order.
        kept.sort_by(|a, b| a.score.total_cmp(&b.score));
        kept.reverse();

        let removed = total - kept.len();
        if removed > 0 {
            tracing::info!(topic = %topic, removed, source, "dropped run entries");
        }
        for (rank, e) in kept.iter().enumerate() {
            writeln!(
                out,
                "{topic} {} {} {rank} {} {}",
                e.q0, e.doc_id, e.score_text, e.run_name
            )
            .map_err(|err| CollectionError::io(source, err))?;
        }
        summary.kept += kept.len();
        summary.removed += removed;
    }
    out.flush().map_err(|e| CollectionError::io(source, e))?;
    Ok(summary)
}

/// Filters one qrels file: a judgement is kept iff its document id (third
/// field) is in `ids`. Kept lines are copied unchanged.
///
/// # Errors
///
/// Returns [`CollectionError::MalformedQrels`] for a line with fewer than
/// three fields and [`CollectionError::Io`] on read or write failure.
pub fn filter_qrels<R: BufRead, W: Write>(
    reader: R,
    source: &str,
    ids: &HashSet<String>,
    mut out: W,
) -> Result<FilterSummary, CollectionError> {
    let mut summary = FilterSummary::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CollectionError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let doc_id = line
            .split_whitespace()
            .nth(2)
            .ok_or_else(|| CollectionError::MalformedQrels {
                path: source.to_owned(),
                line: idx + 1,
            })?;
        if ids.contains(doc_id) {
            writeln!(out, "{line}").map_err(|e| CollectionError::io(source, e))?;
            summary.kept += 1;
        } else {
            summary.removed += 1;
        }
    }
    out.flush().map_err(|e| CollectionError::io(source, e))?;
    tracing::info!(source, removed = summary.removed, "qrels filtered");
    Ok(summary)
}

fn filter_file<F>(path: &Path, filter: F) -> Result<FilterSummary, CollectionError>
where
    F: FnOnce(Box<dyn BufRead>, &str, BufWriter<File>) -> Result<FilterSummary, CollectionError>,
{
    let source = path.display().to_string();
    let target = filtered_path(path);
    let reader =
        twcorpus_core::io::open_lines(path).map_err(|e| CollectionError::io(&source, e))?;
    let file = File::create(&target)
        .map_err(|e| CollectionError::io(target.display().to_string(), e))?;
    filter(reader, &source, BufWriter::new(file))
}

/// Filters the run at `path` into `<path>.filtered`.
///
/// # Errors
///
/// See [`filter_run`]; also fails if either file cannot be opened.
pub fn filter_run_file(
    path: &Path,
    ids: &HashSet<String>,
) -> Result<FilterSummary, CollectionError> {
    filter_file(path, |reader, source, out| filter_run(reader, source, ids, out))
}

/// Filters the qrels at `path` into `<path>.filtered`.
///
/// # Errors
///
/// See [`filter_qrels`]; also fails if either file cannot be opened.
pub fn filter_qrels_file(
    path: &Path,
    ids: &HashSet<String>,
) -> Result<FilterSummary, CollectionError> {
    filter_file(path, |reader, source, out| filter_qrels(reader, source, ids, out))
}
