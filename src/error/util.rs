//! Utility functions for error handling
//!
//! Helpers that attach path information to IO failures so a failed run names
//! the file or directory it tripped over.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{EtlError, Result};

/// Extension trait for attaching a path to IO results
pub trait IoResultExt<T> {
    /// Convert an `io::Result` into a crate result carrying `path`
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| EtlError::IoAt {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Check that a directory exists and is readable
///
/// # Arguments
/// * `path` - The directory to check
/// * `purpose` - Why the directory is needed (for error context)
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(EtlError::IoAt {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found (needed for {purpose})"),
            ),
        });
    }

    fs::read_dir(path).with_path(path).map(|_| ())
}

/// Read a file's raw bytes with the path in any error
pub fn safe_read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_path(path)
}

/// Safely read a file to string with the path in any error
pub fn safe_read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_path(path)
}
