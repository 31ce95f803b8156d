//! Error types for deployment persistence.

use std::path::PathBuf;

/// Errors that can occur saving or loading a network file.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Reading, writing, or renaming a network file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A network file could not be encoded or decoded.
    #[error("Serialization error in {path}: {source}")]
    Serialization {
        /// File involved.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The network name cannot be used as a file name.
    #[error("Invalid network name: {0:?}")]
    InvalidNetwork(String),

    /// A file holds a different network than the one requested.
    #[error("Network file {path} belongs to `{found}`, expected `{expected}`")]
    NetworkMismatch {
        /// File involved.
        path: PathBuf,
        /// Requested network.
        expected: String,
        /// Network recorded in the file.
        found: String,
    },
}
