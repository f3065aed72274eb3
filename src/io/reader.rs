//! File reading and writing helpers.
//!
//! All helpers map `std::io` failures onto [`IoError`] variants carrying the
//! offending path.

use crate::error::{IoError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Maximum file size to read into memory (256MB).
const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns an error if the file is missing, too large, unreadable, or not
/// valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use recap_rs::io::read_file;
///
/// let content = read_file("chat.txt").unwrap();
/// ```
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let size = std::fs::metadata(path_ref)
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();

    if size > MAX_FILE_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
        }
        .into());
    }

    let bytes = std::fs::read(path_ref).map_err(|e| IoError::ReadFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|e| {
        IoError::ReadFailed {
            path: path_str,
            reason: format!("invalid UTF-8: {e}"),
        }
        .into()
    })
}

/// Writes content to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent(path_ref)?;

    std::fs::write(path_ref, content).map_err(|e| IoError::WriteFailed {
        path: path_ref.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Appends content to a file, creating it (and its parent directories) if
/// needed.
///
/// # Errors
///
/// Returns an error if directory creation, opening or writing fails.
pub fn append_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent(path_ref)?;

    let write_failed = |e: std::io::Error| IoError::WriteFailed {
        path: path_ref.to_string_lossy().to_string(),
        reason: e.to_string(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_ref)
        .map_err(write_failed)?;
    file.write_all(content.as_bytes()).map_err(write_failed)?;

    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
