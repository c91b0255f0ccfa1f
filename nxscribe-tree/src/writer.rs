//! Boundary to the serialization backend.

use crate::GroupNode;
use std::path::Path;

/// A sink that serializes a finished tree to a file.
///
/// Builders never perform I/O themselves; they hand the root group to a
/// `TreeWriter` in three steps: open the file, mount the root group, flush.
/// Writers must not read attribute or dataset values back from disk.
pub trait TreeWriter {
    /// Error type of the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates (truncating) and opens the file at `path` for writing.
    ///
    /// # Errors
    /// Returns a backend error if the file cannot be created.
    fn create_and_open_for_write(&mut self, path: &Path) -> Result<(), Self::Error>;

    /// Writes `group` and everything below it at `mount_path` (usually `"/"`).
    ///
    /// # Errors
    /// Returns a backend error if the file is not open or a write fails.
    fn add_node(&mut self, mount_path: &str, group: &GroupNode) -> Result<(), Self::Error>;

    /// Flushes buffered output to disk.
    ///
    /// # Errors
    /// Returns a backend error if the flush fails.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
