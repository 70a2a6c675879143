//! Error types for the auth gate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while persisting or restoring a session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token file could not be read, written or removed.
    #[error("Token store I/O error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The token file exists but doesn't hold a session.
    #[error("Token store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A session couldn't be serialized.
    #[error("Session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
