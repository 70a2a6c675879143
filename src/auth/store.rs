//! Session persistence backends.

use crate::auth::error::AuthError;
use crate::auth::Session;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Trait for session storage backends.
pub trait TokenStore: Send + Sync {
    /// Persist `session`, replacing any previous one.
    fn store(&self, session: &Session) -> Result<(), AuthError>;

    /// Load the persisted session, if any.
    fn load(&self) -> Result<Option<Session>, AuthError>;

    /// Forget the persisted session. Deleting nothing is not an error.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Session stored as a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn store(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(session)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| self.storage_error(e))?;

        // Owner-only, the file holds a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(|e| self.storage_error(e))?;
        }

        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| AuthError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

/// Session kept only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn store(&self, session: &Session) -> Result<(), AuthError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, AuthError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
