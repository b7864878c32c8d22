//! Random access into a JSONL file by an identifier field.
//!
//! Opening scans the file once and remembers the byte offset of each line, so
//! only the offsets stay in memory. Lookups seek back to the line and parse it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use serde_json::Value;

use crate::error::CollectionError;

#[derive(Debug)]
pub struct JsonlLookup {
    path: String,
    reader: BufReader<File>,
    offsets: HashMap<String, u64>,
}

impl JsonlLookup {
    /// Indexes every line of `path` by the string found under `key`.
    /// Blank lines are skipped; when a key repeats the later line wins.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Io`] if the file cannot be read,
    /// [`CollectionError::Deserialize`] for a line that is not JSON, and
    /// [`CollectionError::MissingKey`] for a line without the key.
    pub fn open(path: &Path, key: &str) -> Result<Self, CollectionError> {
        let shown = path.display().to_string();
        let file = File::open(path).map_err(|e| CollectionError::io(&shown, e))?;
        let mut reader = BufReader::new(file);

        let mut offsets = HashMap::new();
        let mut offset = 0u64;
        let mut line = String::new();
        let mut line_no = 0usize;
        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| CollectionError::io(&shown, e))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            if !line.trim().is_empty() {
                let value: Value = serde_json::from_str(&line).map_err(|e| {
                    CollectionError::deserialize(format!("{shown} line {line_no}"), e)
                })?;
                let id = value.get(key).and_then(Value::as_str).ok_or_else(|| {
                    CollectionError::MissingKey {
                        path: shown.clone(),
                        line: line_no,
                        key: key.to_owned(),
                    }
                })?;
                offsets.insert(id.to_owned(), offset);
            }
            offset += read as u64;
        }

        tracing::info!(path = %shown, entries = offsets.len(), "lookup index built");
        Ok(Self {
            path: shown,
            reader,
            offsets,
        })
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.offsets.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Reads the line indexed under `id`, or `None` if it was never seen.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Io`] if the seek or read fails and
    /// [`CollectionError::Deserialize`] if the line changed underneath us.
    pub fn get(&mut self, id: &str) -> Result<Option<Value>, CollectionError> {
        let Some(&offset) = self.offsets.get(id) else {
            return Ok(None);
        };
        let mut line = String::new();
        self.reader
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.reader.read_line(&mut line))
            .map_err(|e| CollectionError::io(&self.path, e))?;
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| CollectionError::deserialize(format!("{} record {id}", self.path), e))
    }
}
