//! The progress ledger: identifiers already resolved by this or a prior run.
//!
//! The ledger is rebuilt at startup from prior error logs and from the record
//! output file, which is only ever appended to. Whatever reached disk before a
//! crash is absorbed on the next start, so no separate checkpoint exists.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use serde_json::Value;

use crate::error::FetchError;
use crate::types::id_field;

#[derive(Debug, Default, Clone)]
pub struct Ledger {
    resolved: HashSet<String>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as resolved. Returns `false` if it already was.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.resolved.insert(id.into())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.resolved.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Absorbs a prior error log: one JSON object per line carrying the failed
    /// identifier under `value`. Blank lines are ignored.
    ///
    /// Returns the number of entries read.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MalformedErrorLog`] on the first line that is not
    /// JSON or lacks a `value`, and [`FetchError::Io`] on read failure.
    pub fn absorb_error_log<R: BufRead>(
        &mut self,
        reader: R,
        path: &str,
    ) -> Result<usize, FetchError> {
        let mut absorbed = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| FetchError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |reason: String| FetchError::MalformedErrorLog {
                path: path.to_owned(),
                line: idx + 1,
                reason,
            };
            let entry: Value = serde_json::from_str(&line).map_err(|e| malformed(e.to_string()))?;
            let id = id_field(&entry, "value")
                .ok_or_else(|| malformed("missing `value` field".to_string()))?;
            self.insert(id);
            absorbed += 1;
        }
        Ok(absorbed)
    }

    /// Absorbs identifiers from an existing record output file.
    ///
    /// Normalized records carry `tweetid`, raw posts carry `id`. Lines are
    /// read as bytes, so a record torn by a crash mid-write is logged and
    /// skipped even when the tear splits a multibyte character.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] on read failure.
    pub fn absorb_output<R: BufRead>(
        &mut self,
        mut reader: R,
        path: &str,
    ) -> Result<usize, FetchError> {
        let mut absorbed = 0;
        let mut line_no = 0usize;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| FetchError::io(path, e))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let id = serde_json::from_slice::<Value>(&buf)
                .ok()
                .and_then(|v| id_field(&v, "tweetid").or_else(|| id_field(&v, "id")));
            match id {
                Some(id) => {
                    self.insert(id);
                    absorbed += 1;
                }
                None => {
                    tracing::warn!(path, line = line_no, "skipping unreadable output line");
                }
            }
        }
        Ok(absorbed)
    }

    /// Absorbs every prior error log in `paths`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::absorb_error_log`]; also fails if a file cannot be opened.
    pub fn absorb_error_log_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<(), FetchError> {
        for path in paths {
            let path = path.as_ref();
            let shown = path.display().to_string();
            tracing::info!(path = %shown, "reading prior error log");
            let reader =
                twcorpus_core::io::open_lines(path).map_err(|e| FetchError::io(&shown, e))?;
            let count = self.absorb_error_log(reader, &shown)?;
            tracing::info!(path = %shown, entries = count, "prior error log absorbed");
        }
        Ok(())
    }

    /// Absorbs the record output file when it already exists (resume).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the existing file cannot be read.
    pub fn absorb_output_file(&mut self, path: &Path) -> Result<(), FetchError> {
        if !path.exists() {
            return Ok(());
        }
        let shown = path.display().to_string();
        tracing::warn!(path = %shown, "output already exists; resuming from it");
        let reader = twcorpus_core::io::open_lines(path).map_err(|e| FetchError::io(&shown, e))?;
        let count = self.absorb_output(reader, &shown)?;
        tracing::info!(path = %shown, records = count, "existing records absorbed");
        Ok(())
    }

    /// Filters `ids` down to what still needs fetching, in input order.
    ///
    /// Identifiers are trimmed; blank lines, ledger hits and repeats are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NothingToProcess`] if nothing remains.
    pub fn pending<I>(&self, ids: I) -> Result<Vec<String>, FetchError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let pending: Vec<String> = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && !self.contains(id))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if pending.is_empty() {
            return Err(FetchError::NothingToProcess);
        }
        Ok(pending)
    }
}

/// Reads the input identifier list, one identifier per line (gzip aware).
///
/// # Errors
///
/// Returns [`FetchError::Io`] if the file cannot be opened or read.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>, FetchError> {
    let shown = path.display().to_string();
    let reader = twcorpus_core::io::open_lines(path).map_err(|e| FetchError::io(&shown, e))?;
    reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FetchError::io(&shown, e))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    /// One whole record followed by a record cut inside a multibyte character.
    fn torn_output() -> Vec<u8> {
        let mut out = b"{\"tweetid\":\"1\",\"text\":\"a\"}\n".to_vec();
        out.extend_from_slice(b"{\"tweetid\":\"2\",\"text\":\"");
        out.extend_from_slice(&"سلام".as_bytes()[..3]);
        out
    }

    #[test]
    fn error_log_values_are_absorbed() {
        let log = "{\"value\":\"7\",\"title\":\"Not Found Error\"}\n\n{\"value\":\"8\"}\n";
        let mut ledger = Ledger::new();
        let n = ledger.absorb_error_log(Cursor::new(log), "errors.jsonl").unwrap();
        assert_eq!(n, 2);
        assert!(ledger.contains("7"));
        assert!(ledger.contains("8"));
    }

    #[test]
    fn error_log_line_without_value_is_fatal() {
        let log = "{\"value\":\"7\"}\n{\"resource_id\":\"8\"}\n";
        let mut ledger = Ledger::new();
        let err = ledger
            .absorb_error_log(Cursor::new(log), "errors.jsonl")
            .unwrap_err();
        assert!(
            matches!(err, FetchError::MalformedErrorLog { ref path, line: 2, .. } if path == "errors.jsonl"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn error_log_bare_string_is_fatal() {
        let mut ledger = Ledger::new();
        let err = ledger
            .absorb_error_log(Cursor::new("\"123\"\n"), "errors.jsonl")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedErrorLog { line: 1, .. }));
    }

    #[test]
    fn error_log_invalid_json_is_fatal() {
        let mut ledger = Ledger::new();
        let err = ledger
            .absorb_error_log(Cursor::new("{not json\n"), "e")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedErrorLog { line: 1, .. }));
    }

    #[test]
    fn output_absorbs_records_and_raw_posts_and_skips_torn_lines() {
        let out = "{\"tweetid\":\"1\",\"text\":\"a\"}\n{\"id\":\"2\",\"text\":\"b\"}\n{\"tweetid\":\"3\",\"te";
        let mut ledger = Ledger::new();
        let n = ledger.absorb_output(Cursor::new(out), "out.jsonl").unwrap();
        assert_eq!(n, 2);
        assert!(ledger.contains("1"));
        assert!(ledger.contains("2"));
        assert!(!ledger.contains("3"));
    }

    #[test]
    fn output_tail_torn_inside_a_multibyte_character_is_skipped() {
        let out = torn_output();
        let mut ledger = Ledger::new();
        let n = ledger.absorb_output(Cursor::new(out), "out.jsonl").unwrap();
        assert_eq!(n, 1);
        assert!(ledger.contains("1"));
        assert!(!ledger.contains("2"));
    }

    #[test]
    fn resume_after_multibyte_tear_keeps_prior_and_new_records() {
        use crate::sink::{JsonlFileSink, LineSink};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.jsonl");
        let out = torn_output();
        std::fs::write(&path, out).unwrap();

        let mut ledger = Ledger::new();
        ledger.absorb_output_file(&path).unwrap();
        assert_eq!(ledger.len(), 1);

        let mut sink = JsonlFileSink::open_append(&path).unwrap();
        sink.append(&["{\"tweetid\":\"3\",\"text\":\"سلام\"}".to_string()])
            .unwrap();
        drop(sink);

        let mut resumed = Ledger::new();
        resumed.absorb_output_file(&path).unwrap();
        assert!(resumed.contains("1"));
        assert!(resumed.contains("3"));
        assert!(!resumed.contains("2"));
        assert_eq!(resumed.len(), 2);
    }

    #[test]
    fn pending_filters_ledger_blanks_and_repeats() {
        let mut ledger = Ledger::new();
        ledger.insert("2");
        let pending = ledger
            .pending(strings(&["1", " 2 ", "", "3\r", "1", "4"]))
            .unwrap();
        assert_eq!(pending, strings(&["1", "3", "4"]));
    }

    #[test]
    fn pending_fails_when_everything_is_known() {
        let mut ledger = Ledger::new();
        ledger.insert("1");
        assert!(matches!(
            ledger.pending(strings(&["1", ""])),
            Err(FetchError::NothingToProcess)
        ));
    }

    #[test]
    fn missing_output_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::new();
        ledger
            .absorb_output_file(&dir.path().join("absent.jsonl"))
            .unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn read_identifiers_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "30\n10\n20\n").unwrap();
        assert_eq!(read_identifiers(&path).unwrap(), strings(&["30", "10", "20"]));
    }
}
