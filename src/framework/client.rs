//! # Sync Handle
//!
//! The interface half of a [`ResourceSync`](crate::framework::ResourceSync).

use crate::framework::entity::SyncEntity;
use crate::framework::error::SyncError;
use crate::framework::message::SyncRequest;
use crate::framework::state::SyncView;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::instrument;

/// A type-safe handle for driving and observing a `ResourceSync`.
///
/// * **Cloneable** – holds a command sender and a watch receiver.
/// * **Acknowledged** – every command resolves once the sync has applied its
///   synchronous part (query change, optimistic removal, validation). Network outcomes
///   show up later in the published [`SyncView`].
/// * **Closed** – once the sync is unmounted every call returns [`SyncError::Closed`].
pub struct SyncHandle<T: SyncEntity> {
    sender: mpsc::Sender<SyncRequest<T>>,
    observer: watch::Receiver<SyncView<T>>,
}

impl<T: SyncEntity> Clone for SyncHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            observer: self.observer.clone(),
        }
    }
}

impl<T: SyncEntity> SyncHandle<T> {
    pub(crate) fn new(
        sender: mpsc::Sender<SyncRequest<T>>,
        observer: watch::Receiver<SyncView<T>>,
    ) -> Self {
        Self { sender, observer }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<R, SyncError>>) -> SyncRequest<T>,
    ) -> Result<R, SyncError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| SyncError::Closed)?;
        response.await.map_err(|_| SyncError::Closed)?
    }

    /// Store raw search input and (re)start the debounce window.
    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn set_search_term(&self, raw: &str) -> Result<(), SyncError> {
        let raw = raw.to_string();
        self.request(|respond_to| SyncRequest::SetSearchTerm { raw, respond_to })
            .await
    }

    /// Move to page `page`. Returns `false` when the request was out of range or
    /// already current, in which case nothing was fetched.
    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn set_page(&self, page: u32) -> Result<bool, SyncError> {
        self.request(|respond_to| SyncRequest::SetPage { page, respond_to })
            .await
    }

    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.request(|respond_to| SyncRequest::Refresh { respond_to })
            .await
    }

    /// Validate and send a create. Validation failures are returned here; server
    /// failures surface as an error notice.
    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn create(&self, params: T::Create) -> Result<(), SyncError> {
        self.request(|respond_to| SyncRequest::Create { params, respond_to })
            .await
    }

    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn update(&self, id: T::Id, params: T::Update) -> Result<(), SyncError> {
        self.request(|respond_to| SyncRequest::Update {
            id,
            params,
            respond_to,
        })
        .await
    }

    /// Optimistically remove `id` from the mirror and delete it on the server.
    #[instrument(skip(self), fields(entity_type = T::LABEL))]
    pub async fn remove(&self, id: T::Id) -> Result<(), SyncError> {
        self.request(|respond_to| SyncRequest::Remove { id, respond_to })
            .await
    }

    /// Stop the sync. Responses still in flight are never applied.
    pub async fn unmount(&self) -> Result<(), SyncError> {
        self.request(|respond_to| SyncRequest::Unmount { respond_to })
            .await
    }

    /// The most recently published view.
    pub fn view(&self) -> SyncView<T> {
        self.observer.borrow().clone()
    }

    /// Wait until the published view satisfies `predicate`, checking the current one
    /// first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SyncView<T>) -> bool,
    ) -> Result<SyncView<T>, SyncError> {
        let mut observer = self.observer.clone();
        let view = observer
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| SyncError::Closed)?;
        Ok(view.clone())
    }

    /// Wait for the next published transition.
    pub async fn changed(&mut self) -> Result<SyncView<T>, SyncError> {
        self.observer
            .changed()
            .await
            .map_err(|_| SyncError::Closed)?;
        Ok(self.observer.borrow_and_update().clone())
    }

    /// A receiver that is notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SyncView<T>> {
        self.observer.clone()
    }
}
