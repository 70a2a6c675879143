//! # HTTP Collections
//!
//! [`RemoteCollection`] over the ledger REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list` | `GET {path}?page=&limit=&search=` |
//! | `create` | `POST {path}` |
//! | `update` | `PUT {path}/{id}` |
//! | `delete` | `DELETE {path}/{id}` |

use crate::framework::{ListParams, RemoteCollection, Snapshot, SyncEntity, SyncError};
use crate::http::client::{ApiClient, Payload, NO_QUERY};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{instrument, warn};

/// How a collection endpoint shapes its list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// `{ <items_key>: [...], total, totalPages }`, paginated and searchable server-side.
    Paged { items_key: &'static str },
    /// A bare JSON array holding the whole collection. No query is sent.
    Bare,
}

/// One server collection, e.g. `/transactions`.
pub struct HttpCollection<T> {
    client: Arc<ApiClient>,
    path: String,
    shape: ListShape,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpCollection<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            path: self.path.clone(),
            shape: self.shape,
            _entity: PhantomData,
        }
    }
}

impl<T> HttpCollection<T> {
    pub fn new(client: Arc<ApiClient>, path: impl Into<String>, shape: ListShape) -> Self {
        Self {
            client,
            path: path.into().trim_matches('/').to_string(),
            shape,
            _entity: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &impl std::fmt::Display) -> String {
        format!("{}/{}", self.path, id)
    }
}

#[async_trait]
impl<T> RemoteCollection<T> for HttpCollection<T>
where
    T: SyncEntity + DeserializeOwned,
    T::Create: Serialize,
    T::Update: Serialize,
{
    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    async fn list(&self, params: ListParams) -> Result<Snapshot<T>, SyncError> {
        let payload = match self.shape {
            ListShape::Paged { .. } => self.client.get(&self.path, &params).await?,
            ListShape::Bare => self.client.get(&self.path, &NO_QUERY).await?,
        };
        parse_page(payload, self.shape)
    }

    async fn create(&self, params: T::Create) -> Result<T, SyncError> {
        self.client.post_json(&self.path, &params).await
    }

    async fn update(&self, id: T::Id, params: T::Update) -> Result<T, SyncError> {
        self.client.put_json(&self.item_path(&id), &params).await
    }

    async fn delete(&self, id: T::Id) -> Result<(), SyncError> {
        self.client.delete(&self.item_path(&id)).await
    }
}

/// Turns a list response into a snapshot.
///
/// Anything missing or of the wrong type is a `Server` error carrying the response
/// status; nothing half-parsed reaches the mirror.
pub fn parse_page<T: DeserializeOwned>(
    payload: Payload,
    shape: ListShape,
) -> Result<Snapshot<T>, SyncError> {
    let status = payload.status;
    let mismatch = |what: &str| {
        warn!(status, what, "List response did not match the expected shape");
        SyncError::Server {
            status,
            message: None,
        }
    };

    match shape {
        ListShape::Bare => {
            let items: Vec<T> = payload.decode()?;
            let total = items.len() as u64;
            Ok(Snapshot::new(items, total, 1))
        }
        ListShape::Paged { items_key } => {
            let serde_json::Value::Object(mut envelope) = payload.body else {
                return Err(mismatch("envelope"));
            };

            let items: Vec<T> = envelope
                .remove(items_key)
                .and_then(|raw| serde_json::from_value(raw).ok())
                .ok_or_else(|| mismatch(items_key))?;
            let total = envelope
                .get("total")
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| mismatch("total"))?;
            let total_pages = envelope
                .get("totalPages")
                .and_then(serde_json::Value::as_u64)
                .and_then(|pages| u32::try_from(pages).ok())
                .ok_or_else(|| mismatch("totalPages"))?;
            Ok(Snapshot::new(items, total, total_pages))
        }
    }
}
