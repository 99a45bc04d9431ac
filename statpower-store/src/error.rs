//! Store Errors

use thiserror::Error;

/// Errors surfaced by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A worker panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}
