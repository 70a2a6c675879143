//! # Auth Gate
//!
//! The process-wide holder of the bearer token.
//!
//! Every request made by the [`ApiClient`](crate::http::ApiClient) reads the token
//! from one shared [`AuthGate`]; every `401` answered by the server goes through
//! [`AuthGate::invalidate`], which drops the session, clears the persisted copy and
//! publishes [`AuthStatus::SignedOut`] so whoever owns navigation can send the user
//! back to the login screen.

pub mod error;
pub mod store;

pub use error::AuthError;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{info, warn};

/// A signed-in user: the bearer token and the profile returned alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub user: serde_json::Value,
}

impl Session {
    pub fn new(token: impl Into<String>, user: serde_json::Value) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Splits an auth response of the shape `{ "token": ..., ...profile }`.
    ///
    /// Returns `None` when there is no string `token` field.
    pub fn from_auth_response(body: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(mut fields) = body else {
            return None;
        };
        let token = match fields.remove("token")? {
            serde_json::Value::String(token) if !token.is_empty() => token,
            _ => return None,
        };
        Some(Self {
            token,
            user: serde_json::Value::Object(fields),
        })
    }
}

/// Why there is no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// Nothing was stored at startup.
    NoSession,
    /// The user logged out.
    Logout,
    /// The server rejected the token.
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    SignedIn,
    SignedOut(SignOutReason),
}

impl AuthStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn)
    }
}

/// Shared bearer-token holder.
///
/// Construct it once with [`AuthGate::load`] and share the returned `Arc`.
pub struct AuthGate {
    session: RwLock<Option<Session>>,
    store: Box<dyn TokenStore>,
    status: watch::Sender<AuthStatus>,
}

impl AuthGate {
    /// Restores the persisted session, if any.
    pub fn load(store: impl TokenStore + 'static) -> Result<Arc<Self>, AuthError> {
        let session = store.load()?;
        let status = match session {
            Some(_) => AuthStatus::SignedIn,
            None => AuthStatus::SignedOut(SignOutReason::NoSession),
        };
        info!(?status, "Auth gate loaded");
        let (status, _) = watch::channel(status);
        Ok(Arc::new(Self {
            session: RwLock::new(session),
            store: Box::new(store),
            status,
        }))
    }

    /// The token to attach to the next request.
    pub fn bearer(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.token.clone())
    }

    /// Profile of the signed-in user.
    pub fn user(&self) -> Option<serde_json::Value> {
        self.read().as_ref().map(|session| session.user.clone())
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// A receiver notified on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Persists `session` and makes it the active one.
    pub fn sign_in(&self, session: Session) -> Result<(), AuthError> {
        self.store.store(&session)?;
        *self.write() = Some(session);
        self.status.send_replace(AuthStatus::SignedIn);
        info!("Signed in");
        Ok(())
    }

    /// Replaces the profile of the signed-in user and persists it with the token.
    ///
    /// Returns `false` and stores nothing when nobody is signed in.
    pub fn update_user(&self, user: serde_json::Value) -> Result<bool, AuthError> {
        let mut session = self.write();
        let Some(current) = session.as_mut() else {
            return Ok(false);
        };
        let updated = Session::new(current.token.clone(), user);
        self.store.store(&updated)?;
        *current = updated;
        info!("Profile updated");
        Ok(true)
    }

    /// Drops the session and its persisted copy.
    pub fn logout(&self) -> Result<(), AuthError> {
        *self.write() = None;
        self.store.clear()?;
        self.status
            .send_replace(AuthStatus::SignedOut(SignOutReason::Logout));
        info!("Logged out");
        Ok(())
    }

    /// Handles a `401`: drops the session and signals `SignedOut(Unauthorized)`.
    ///
    /// Returns `true` if this call signed the user out. Concurrent 401s for the same
    /// session notify subscribers once.
    pub fn invalidate(&self) -> bool {
        let had_session = self.write().take().is_some();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        let changed = self.status.send_if_modified(|status| {
            let next = AuthStatus::SignedOut(SignOutReason::Unauthorized);
            if *status == next {
                return false;
            }
            *status = next;
            true
        });
        if changed || had_session {
            warn!("Session rejected by server, signed out");
        }
        changed
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_session_from_auth_response() {
        let session = Session::from_auth_response(json!({
            "token": "tok-1",
            "name": "Asha",
            "email": "asha@example.com"
        }))
        .unwrap();

        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user, json!({ "name": "Asha", "email": "asha@example.com" }));

        assert!(Session::from_auth_response(json!({ "name": "no token" })).is_none());
        assert!(Session::from_auth_response(json!({ "token": 42 })).is_none());
        assert!(Session::from_auth_response(json!(["token"])).is_none());
    }

    #[test]
    fn test_load_restores_persisted_session() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        FileTokenStore::new(&path)
            .store(&Session::new("persisted", json!({})))
            .unwrap();

        let gate = AuthGate::load(FileTokenStore::new(&path)).unwrap();
        assert_eq!(gate.bearer(), Some("persisted".into()));
        assert_eq!(gate.status(), AuthStatus::SignedIn);
    }

    #[test]
    fn test_sign_in_and_logout() {
        let gate = AuthGate::load(MemoryTokenStore::new()).unwrap();
        assert_eq!(
            gate.status(),
            AuthStatus::SignedOut(SignOutReason::NoSession)
        );
        assert!(gate.bearer().is_none());

        gate.sign_in(Session::new("tok", json!({ "name": "Asha" })))
            .unwrap();
        assert_eq!(gate.bearer(), Some("tok".into()));
        assert_eq!(gate.user(), Some(json!({ "name": "Asha" })));
        assert!(gate.status().is_signed_in());

        gate.logout().unwrap();
        assert!(gate.bearer().is_none());
        assert_eq!(gate.status(), AuthStatus::SignedOut(SignOutReason::Logout));
    }

    #[test]
    fn test_invalidate_clears_store_and_notifies_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        let gate = AuthGate::load(FileTokenStore::new(&path)).unwrap();
        gate.sign_in(Session::new("tok", json!({}))).unwrap();
        assert!(path.exists());

        let mut status = gate.subscribe();

        assert!(gate.invalidate());
        assert!(!gate.invalidate());

        assert!(gate.bearer().is_none());
        assert!(!path.exists());
        assert!(status.has_changed().unwrap());
        assert_eq!(
            *status.borrow_and_update(),
            AuthStatus::SignedOut(SignOutReason::Unauthorized)
        );
        assert!(!status.has_changed().unwrap());
    }

    #[test]
    fn test_update_user_persists_with_token() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        let gate = AuthGate::load(FileTokenStore::new(&path)).unwrap();

        assert!(!gate.update_user(json!({ "name": "Nobody" })).unwrap());
        assert!(!path.exists());

        gate.sign_in(Session::new("tok", json!({ "name": "Asha" })))
            .unwrap();
        assert!(gate.update_user(json!({ "name": "Asha K", "shopName": "Asha Stores" })).unwrap());
        assert_eq!(gate.user(), Some(json!({ "name": "Asha K", "shopName": "Asha Stores" })));
        assert_eq!(gate.bearer(), Some("tok".into()));

        let restored = FileTokenStore::new(&path).load().unwrap().unwrap();
        assert_eq!(restored.token, "tok");
        assert_eq!(restored.user["shopName"], "Asha Stores");
    }
}
