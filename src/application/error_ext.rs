//! Error conversion helpers for source-file reading
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// let content = fs::read_to_string(&path).with_path_context("read codex", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ApplicationError::SourceNotFound(path.to_path_buf())
            } else {
                ApplicationError::io(format!("{}: {}", action, path.display()), e)
            }
        })
    }
}
