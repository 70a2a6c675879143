//! Generic synchronization framework for server-backed collections.
//!
//! This module provides the building blocks for keeping a local, observable mirror of a
//! paginated, searchable server collection consistent under concurrent user actions.
//!
//! # Main Components
//!
//! - [`SyncEntity`] - Trait that resource types implement to be mirrored
//! - [`ResourceSync`] - Generic actor that owns one mirror and its query
//! - [`SyncHandle`] - Type-safe handle for driving and observing a `ResourceSync`
//! - [`RemoteCollection`] - The server-side CRUD contract a mirror talks to
//! - [`AggregateLoader`] - All-or-nothing loader for several independent endpoints
//! - [`SyncError`] - Common error taxonomy
//!
//! # Testing
//!
//! See [`mock`] module for scripted and channel-driven remotes.

pub mod actor;
pub mod aggregate;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod remote;
pub mod state;

// Re-export core types for convenience
pub use actor::ResourceSync;
pub use aggregate::{AggregateLoader, AggregateView, FetchFuture, Slot};
pub use client::SyncHandle;
pub use entity::SyncEntity;
pub use error::SyncError;
pub use message::SyncRequest;
pub use remote::{ListParams, RemoteCollection};
pub use state::{Notice, NoticeKind, Notices, Query, Snapshot, SyncState, SyncView};
