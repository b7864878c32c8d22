//! Append-only JSONL outputs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Destination for serialized output lines.
///
/// Each call carries one batch worth of lines and must be durable in the OS
/// before returning, so a crash loses at most the batch in flight.
pub trait LineSink {
    /// Appends `lines` (each without a trailing newline) and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the write or flush fails.
    fn append(&mut self, lines: &[String]) -> Result<(), FetchError>;
}

impl LineSink for Vec<String> {
    fn append(&mut self, lines: &[String]) -> Result<(), FetchError> {
        self.extend_from_slice(lines);
        Ok(())
    }
}

/// A JSONL file opened in append mode; existing content is never truncated.
pub struct JsonlFileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlFileSink {
    /// Opens (or creates) `path` for appending, creating parent directories.
    ///
    /// A final line left without its newline by an interrupted write is
    /// terminated first so the next record starts on a line of its own.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the directory or file cannot be created.
    pub fn open_append(path: &Path) -> Result<Self, FetchError> {
        let shown = path.display().to_string();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::io(&shown, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| FetchError::io(&shown, e))?;
        if ends_mid_line(&mut file).map_err(|e| FetchError::io(&shown, e))? {
            tracing::warn!(path = %shown, "terminating torn final line");
            file.write_all(b"\n").map_err(|e| FetchError::io(&shown, e))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl LineSink for JsonlFileSink {
    fn append(&mut self, lines: &[String]) -> Result<(), FetchError> {
        let io_err = |e| FetchError::io(self.path.display().to_string(), e);
        for line in lines {
            self.writer
                .write_all(line.as_bytes())
                .and_then(|()| self.writer.write_all(b"\n"))
                .map_err(io_err)?;
        }
        self.writer.flush().map_err(io_err)
    }
}
