//! # RemoteCollection
//!
//! The collaborator boundary between a [`ResourceSync`](crate::framework::ResourceSync)
//! and the server that owns the collection. Implementations parse responses into typed
//! records at the edge; a payload that doesn't match the contract is reported as
//! [`SyncError::Server`] rather than leaking half-parsed data into the mirror.

use crate::framework::entity::SyncEntity;
use crate::framework::error::SyncError;
use crate::framework::state::Snapshot;
use async_trait::async_trait;
use serde::Serialize;

/// Parameters of a single list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
    pub page: u32,
    #[serde(rename = "limit")]
    pub page_size: u32,
    pub search: String,
}

/// Server-side CRUD contract for one collection.
#[async_trait]
pub trait RemoteCollection<T: SyncEntity>: Send + Sync + 'static {
    /// Fetch one page of the collection, filtered by `params.search`.
    async fn list(&self, params: ListParams) -> Result<Snapshot<T>, SyncError>;

    async fn create(&self, params: T::Create) -> Result<T, SyncError>;

    async fn update(&self, id: T::Id, params: T::Update) -> Result<T, SyncError>;

    async fn delete(&self, id: T::Id) -> Result<(), SyncError>;
}
