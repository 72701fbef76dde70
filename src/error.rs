//! Unified error type for the registry.

use thiserror::Error;

/// All errors a caller of the [`crate::Indexer`] can see.
///
/// Absence is deliberately not represented here: a missing tracked-paths
/// file, registration file, or scan-start directory is an empty result, and
/// a failed port probe is `false`, never an error.
#[derive(Error, Debug)]
pub enum LocportError {
    /// I/O error (file read/write, directory access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write the tracked-paths file
    #[error("failed to write tracked-paths file {path}: {source}")]
    StoreWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to append an address to a project's registration file
    #[error("failed to append to registration file {path}: {source}")]
    DotfileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
