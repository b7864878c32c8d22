//! Line-oriented file readers that transparently handle gzip input.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Returns `true` when the path names a gzip file by its `.gz` suffix.
#[must_use]
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Opens `path` for buffered line reading, decompressing on the fly when the
/// name ends in `.gz`.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened.
pub fn open_lines(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzip_path(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads the first line of `path` (gzip aware), without its line terminator.
///
/// Returns an empty string for an empty file.
///
/// # Errors
///
/// Returns the underlying I/O error on open or read failure.
pub fn first_line(path: &Path) -> io::Result<String> {
    let mut reader = open_lines(path)?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
