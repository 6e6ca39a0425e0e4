//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Per-entry traversal failures never surface here; they are skipped inside
/// the walk. Cancellation is not an error either, see
/// [`SessionOutcome`](super::scanner::SessionOutcome).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The store file could not be opened or its schema could not be created.
    #[error("Failed to open index store at {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed against an already opened store.
    #[error("Index store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Represents an I/O error, typically from preparing the store directory.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// An indexing session is already active and the caller asked to reject.
    #[error("An indexing session is already running")]
    AlreadyRunning,

    /// The dedicated indexing thread could not be created.
    #[error("Failed to spawn indexing worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The indexing thread panicked before reporting an outcome.
    #[error("Indexing worker panicked")]
    WorkerPanicked,
}
