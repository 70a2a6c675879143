//! # Sync Errors
//!
//! This module defines the error taxonomy shared by every remote collection and
//! every [`ResourceSync`](crate::framework::ResourceSync) instance. Network and server
//! failures come from the [`RemoteCollection`](crate::framework::RemoteCollection)
//! boundary; validation failures never leave the process.

/// Errors that can occur while synchronizing a remote collection.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SyncError {
    /// Transport-level failure, no response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived with a failure status.
    ///
    /// `message` carries the server's own error text when the payload had one.
    #[error("Server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    /// Client-side validation rejected a payload before it was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The item is not part of the local mirror.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// The sync actor has been unmounted.
    #[error("Sync closed")]
    Closed,
}

impl SyncError {
    /// Builds a `Server` error with a message taken from the payload.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: Some(message.into()),
        }
    }

    /// HTTP status of a server failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The text shown to the user for this failure.
    ///
    /// Server payload messages and validation messages are shown as-is; every other
    /// kind falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Validation(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
