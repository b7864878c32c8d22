//! Verifies an assembled collection against the released checksum files.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;

use crate::error::CollectionError;

/// Missing ids are only listed when fewer than this many are missing.
pub const MISSING_LIST_LIMIT: usize = 200;

/// Lowercase hex MD5 of `text`'s UTF-8 bytes.
#[must_use]
pub fn hash_text(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// One line of a checksum file. Other released fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecksumEntry {
    pub doc_id: String,
    pub doc_hash: String,
}

#[derive(Debug, Deserialize)]
struct CollectionLine {
    id: String,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    UnknownDoc {
        id: String,
    },
    HashMismatch {
        id: String,
        got: String,
        expected: String,
    },
    CountMismatch {
        found: usize,
        expected: usize,
        /// Present when fewer than [`MISSING_LIST_LIMIT`] ids are missing.
        missing: Option<Vec<String>>,
    },
}

impl fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDoc { id } => write!(f, "cannot find doc `{id}`"),
            Self::HashMismatch { id, got, expected } => {
                write!(f, "hash mismatch for doc `{id}`, got {got} expected {expected}")
            }
            Self::CountMismatch {
                found,
                expected,
                missing,
            } => {
                write!(f, "found {found} docs but expected {expected}")?;
                if let Some(missing) = missing {
                    write!(f, "; missing: {}", missing.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyReport {
    pub found: usize,
    pub expected: usize,
    pub issues: Vec<VerifyIssue>,
    /// Verification halted at the first issue.
    pub stopped_early: bool,
}

impl VerifyReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn record(&mut self, issue: VerifyIssue, early_stop: bool) -> bool {
        tracing::error!(%issue, "verification failed");
        self.issues.push(issue);
        self.stopped_early = early_stop;
        early_stop
    }
}

/// Loads checksum files into a map keyed by document id.
///
/// # Errors
///
/// Returns [`CollectionError::Io`] or [`CollectionError::Deserialize`] for an
/// unreadable file or line.
pub fn load_checksums<P: AsRef<Path>>(
    paths: &[P],
) -> Result<HashMap<String, ChecksumEntry>, CollectionError> {
    let mut entries = HashMap::new();
    for path in paths {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let reader =
            twcorpus_core::io::open_lines(path).map_err(|e| CollectionError::io(&shown, e))?;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CollectionError::io(&shown, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ChecksumEntry = serde_json::from_str(&line).map_err(|e| {
                CollectionError::deserialize(format!("{shown} line {}", idx + 1), e)
            })?;
            entries.insert(entry.doc_id.clone(), entry);
        }
    }
    tracing::info!(docs = entries.len(), "checksums loaded");
    Ok(entries)
}

/// Checks every document of a collection against `checksums`.
///
/// # Errors
///
/// Returns [`CollectionError::Io`] or [`CollectionError::Deserialize`] when
/// the collection cannot be read. Content problems are reported as issues.
pub fn verify_documents<R: BufRead>(
    reader: R,
    source: &str,
    checksums: &HashMap<String, ChecksumEntry>,
    early_stop: bool,
) -> Result<VerifyReport, CollectionError> {
    let mut report = VerifyReport {
        expected: checksums.len(),
        ..VerifyReport::default()
    };
    let mut found = HashSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CollectionError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: CollectionLine = serde_json::from_str(&line).map_err(|e| {
            CollectionError::deserialize(format!("{source} line {}", idx + 1), e)
        })?;

        let Some(reference) = checksums.get(&doc.id) else {
            if report.record(VerifyIssue::UnknownDoc { id: doc.id }, early_stop) {
                return Ok(report);
            }
            continue;
        };
        let got = hash_text(&doc.text);
        if got != reference.doc_hash {
            let issue = VerifyIssue::HashMismatch {
                id: doc.id,
                got,
                expected: reference.doc_hash.clone(),
            };
            if report.record(issue, early_stop) {
                return Ok(report);
            }
            continue;
        }
        found.insert(doc.id);
    }

    report.found = found.len();
    if report.found != report.expected {
        let mut missing: Vec<String> = checksums
            .keys()
            .filter(|id| !found.contains(*id))
            .cloned()
            .collect();
        missing.sort_unstable();
        let issue = VerifyIssue::CountMismatch {
            found: report.found,
            expected: report.expected,
            missing: (missing.len() < MISSING_LIST_LIMIT).then_some(missing),
        };
        report.record(issue, early_stop);
    }

    tracing::info!(
        found = report.found,
        expected = report.expected,
        errors = report.issues.len(),
        "verification finished"
    );
    Ok(report)
}

/// Verifies the collection at `doc_file` (gzip aware) against `id_files`.
///
/// # Errors
///
/// See [`load_checksums`] and [`verify_documents`].
pub fn verify_collection<P: AsRef<Path>>(
    doc_file: &Path,
    id_files: &[P],
    early_stop: bool,
) -> Result<VerifyReport, CollectionError> {
    let checksums = load_checksums(id_files)?;
    let shown = doc_file.display().to_string();
    let reader =
        twcorpus_core::io::open_lines(doc_file).map_err(|e| CollectionError::io(&shown, e))?;
    verify_documents(reader, &shown, &checksums, early_stop)
}
