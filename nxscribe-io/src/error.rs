//! Writer error types.

use thiserror::Error;

/// Result type for writer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Writer error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// The tree cannot be represented in the target format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// `add_node` or `flush` called before `create_and_open_for_write`.
    #[error("no file is open for writing")]
    NotOpen,
}
