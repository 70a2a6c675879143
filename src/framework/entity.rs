//! # SyncEntity Trait
//!
//! The `SyncEntity` trait defines the contract every mirrored resource (transaction,
//! category, ...) implements to be managed by the generic
//! [`ResourceSync`](crate::framework::ResourceSync).
//!
//! # Architecture Note
//! The synchronization layer never looks inside a record beyond its identity. Associated
//! types pin the create and update payloads to the resource, so a `CategoryCreate`
//! can't be sent to a transaction collection.
//!
//! # Provided Methods (Hooks)
//! - [`SyncEntity::validate_create`]
//! - [`SyncEntity::validate_update`]
//!
//! Both default to accepting the payload. A rejection is returned to the caller
//! synchronously as [`SyncError::Validation`](crate::framework::SyncError::Validation)
//! and nothing is sent over the network.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource must implement to be mirrored by ResourceSync.
pub trait SyncEntity: Clone + Debug + Send + Sync + 'static {
    /// Stable unique identifier assigned by the server.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Payload for creating a new record.
    type Create: Send + Sync + Debug + 'static;

    /// Payload for updating an existing record.
    type Update: Send + Sync + Debug + 'static;

    /// Singular, capitalized name used in notices (e.g. `"Transaction"`).
    const LABEL: &'static str;

    /// Plural, lowercase name used in notices (e.g. `"transactions"`).
    const PLURAL: &'static str;

    fn id(&self) -> &Self::Id;

    /// Checks a create payload before it is sent.
    fn validate_create(_params: &Self::Create) -> Result<(), String> {
        Ok(())
    }

    /// Checks an update payload before it is sent.
    fn validate_update(_id: &Self::Id, _params: &Self::Update) -> Result<(), String> {
        Ok(())
    }
}
