//! # Resource Sync Actor
//!
//! This module defines the `ResourceSync`, the component that owns the local mirror of
//! one remote collection. It implements the "Server" side of the Actor Model: commands
//! from handles and completions from background tasks are processed sequentially, so
//! the mirror is never observed mid-update.

use crate::config::SyncConfig;
use crate::framework::client::SyncHandle;
use crate::framework::entity::SyncEntity;
use crate::framework::error::SyncError;
use crate::framework::message::{Completion, Response, SyncRequest, WriteKind};
use crate::framework::remote::{ListParams, RemoteCollection};
use crate::framework::state::{Notice, NoticeKind, Query, Snapshot, SyncState, SyncView};
use std::collections::HashMap;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Remote<T> = Arc<dyn RemoteCollection<T>>;

/// Bookkeeping for a delete that hasn't been confirmed yet.
struct PendingRemoval<T: SyncEntity> {
    id: T::Id,
    /// The mirror exactly as it was before the item was taken out.
    before: Snapshot<T>,
    /// Snapshot generation the removal was applied to.
    epoch: u64,
}

/// The generic controller that mirrors one remote collection.
///
/// # Architecture Note
/// This struct is the "Server" half of the sync. It owns the mirror (query, snapshot,
/// state, notices) and the receiver end of the command channel. Network calls and
/// timers run in their own tasks, but they never touch the mirror: they post a
/// [`Completion`] back to the loop, which applies it in order.
///
/// ## Request ordering
/// Every list request is tagged with a strictly increasing sequence number. A response
/// is applied only if its tag is the highest one issued; anything older is dropped.
/// Nothing is ever aborted on the wire.
///
/// ## Optimistic delete
/// `remove` takes the item out of the mirror immediately and keeps the pre-removal
/// snapshot. If the server rejects the delete, that snapshot is put back exactly
/// (order and `total_count`), unless a newer page has been fetched in the meantime.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `ResourceSync::new()` to get the `sync` (server) and its
///     [`SyncHandle`] (interface).
/// 2.  **Mount**: Spawn `sync.run(remote)` with the collection it mirrors. The initial
///     fetch is issued right away unless `fetch_on_mount` is off.
/// 3.  **Use**: Drive it through the handle; read state with `view()` / `wait_for()`.
/// 4.  **Unmount**: Drop every handle or call `unmount()`. Responses arriving later are
///     discarded with the loop.
///
/// ```rust,ignore
/// let (sync, handle) = ResourceSync::<Transaction>::new(SyncConfig::default());
/// tokio::spawn(sync.run(http_collection));
///
/// handle.set_search_term("rent").await?;
/// let view = handle.wait_for(|v| v.state == SyncState::Ready).await?;
/// ```
pub struct ResourceSync<T: SyncEntity> {
    receiver: mpsc::Receiver<SyncRequest<T>>,
    completions: mpsc::UnboundedReceiver<Completion<T>>,
    completion_sender: mpsc::UnboundedSender<Completion<T>>,
    publisher: watch::Sender<SyncView<T>>,
    config: SyncConfig,
    view: SyncView<T>,
    latest_tag: u64,
    debounce: Option<JoinHandle<()>>,
    debounce_generation: u64,
    removals: HashMap<u64, PendingRemoval<T>>,
    next_removal: u64,
    /// Items taken out optimistically since the snapshot was last replaced.
    removed_since_fetch: Vec<T::Id>,
    snapshot_epoch: u64,
    notice_serial: u64,
}

impl<T: SyncEntity> ResourceSync<T> {
    /// Creates a new `ResourceSync` and its associated `SyncHandle`.
    ///
    /// The sync stays `Idle` until [`run`](Self::run) is awaited.
    pub fn new(config: SyncConfig) -> (Self, SyncHandle<T>) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let (completion_sender, completions) = mpsc::unbounded_channel();
        let view = SyncView::new(Query::new(config.page_size));
        let (publisher, observer) = watch::channel(view.clone());

        let sync = Self {
            receiver,
            completions,
            completion_sender,
            publisher,
            config,
            view,
            latest_tag: 0,
            debounce: None,
            debounce_generation: 0,
            removals: HashMap::new(),
            next_removal: 0,
            removed_since_fetch: Vec::new(),
            snapshot_epoch: 0,
            notice_serial: 0,
        };
        (sync, SyncHandle::new(sender, observer))
    }

    /// Mounts the mirror on `remote` and runs the event loop until unmounted.
    pub async fn run<R: RemoteCollection<T>>(mut self, remote: R) {
        let remote: Remote<T> = Arc::new(remote);
        info!(
            entity_type = T::LABEL,
            page_size = self.view.query.page_size,
            "Sync mounted"
        );

        if self.config.fetch_on_mount {
            self.fetch(&remote);
            self.publish();
        }

        loop {
            tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(request) => {
                        if self.handle_request(request, &remote).is_break() {
                            break;
                        }
                    }
                    None => break,
                },
                Some(completion) = self.completions.recv() => {
                    self.handle_completion(completion, &remote);
                    self.publish();
                }
            }
        }

        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        info!(
            entity_type = T::LABEL,
            pending_removals = self.removals.len(),
            "Sync unmounted"
        );
    }

    /// Applies one command. `Break` stops the loop.
    fn handle_request(&mut self, request: SyncRequest<T>, remote: &Remote<T>) -> ControlFlow<()> {
        match request {
            SyncRequest::SetSearchTerm { raw, respond_to } => {
                debug!(entity_type = T::LABEL, %raw, "Search input");
                self.view.search_input = raw;
                self.schedule_debounce();
                self.ack(respond_to, Ok(()));
            }
            SyncRequest::SetPage { page, respond_to } => {
                let last = self.view.snapshot.last_page();
                let current = self.view.query.page;
                if page < 1 || page > last || page == current {
                    debug!(entity_type = T::LABEL, page, current, last, "Page change ignored");
                    self.ack(respond_to, Ok(false));
                } else {
                    self.view.query.page = page;
                    self.fetch(remote);
                    self.ack(respond_to, Ok(true));
                }
            }
            SyncRequest::Refresh { respond_to } => {
                self.fetch(remote);
                self.ack(respond_to, Ok(()));
            }
            SyncRequest::Create { params, respond_to } => {
                if let Err(reason) = T::validate_create(&params) {
                    warn!(entity_type = T::LABEL, %reason, "Create rejected");
                    self.ack(respond_to, Err(SyncError::Validation(reason)));
                    return ControlFlow::Continue(());
                }
                debug!(entity_type = T::LABEL, ?params, "Create");
                let remote = Arc::clone(remote);
                self.spawn_completion(async move {
                    Completion::Written {
                        kind: WriteKind::Create,
                        result: remote.create(params).await,
                    }
                });
                self.ack(respond_to, Ok(()));
            }
            SyncRequest::Update {
                id,
                params,
                respond_to,
            } => {
                if let Err(reason) = T::validate_update(&id, &params) {
                    warn!(entity_type = T::LABEL, %id, %reason, "Update rejected");
                    self.ack(respond_to, Err(SyncError::Validation(reason)));
                    return ControlFlow::Continue(());
                }
                debug!(entity_type = T::LABEL, %id, ?params, "Update");
                let remote = Arc::clone(remote);
                self.spawn_completion(async move {
                    Completion::Written {
                        kind: WriteKind::Update,
                        result: remote.update(id, params).await,
                    }
                });
                self.ack(respond_to, Ok(()));
            }
            SyncRequest::Remove { id, respond_to } => {
                let result = self.remove_optimistically(id, remote);
                self.ack(respond_to, result);
            }
            SyncRequest::Unmount { respond_to } => {
                let _ = respond_to.send(Ok(()));
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_completion(&mut self, completion: Completion<T>, remote: &Remote<T>) {
        match completion {
            Completion::DebounceElapsed { generation } => {
                if generation != self.debounce_generation {
                    return;
                }
                self.debounce = None;
                self.view.query.search_term = self.view.search_input.clone();
                self.view.query.page = 1;
                info!(
                    entity_type = T::LABEL,
                    search = %self.view.query.search_term,
                    "Search committed"
                );
                self.fetch(remote);
            }
            Completion::Fetched { tag, result } => self.apply_fetch(tag, result, remote),
            Completion::Written { kind, result } => match result {
                Ok(item) => {
                    info!(entity_type = T::LABEL, id = %item.id(), ?kind, "Write confirmed");
                    let verb = match kind {
                        WriteKind::Create => "added",
                        WriteKind::Update => "updated",
                    };
                    self.set_notice(
                        NoticeKind::Success,
                        format!("{} {verb} successfully", T::LABEL),
                    );
                    self.fetch(remote);
                }
                Err(e) => {
                    warn!(entity_type = T::LABEL, ?kind, error = %e, "Write failed");
                    let fallback = format!("Failed to save {}", T::LABEL.to_lowercase());
                    self.set_notice(NoticeKind::Error, e.user_message(&fallback));
                }
            },
            Completion::Removed { removal, result } => {
                self.settle_removal(removal, result, remote);
            }
            Completion::NoticeExpired { kind, serial } => {
                let slot = self.view.notices.slot_mut(kind);
                if slot.as_ref().is_some_and(|notice| notice.serial == serial) {
                    *slot = None;
                }
            }
        }
    }

    /// Issues a list request for the current query and enters `Loading`.
    fn fetch(&mut self, remote: &Remote<T>) {
        self.latest_tag += 1;
        let tag = self.latest_tag;
        let params = ListParams {
            page: self.view.query.page,
            page_size: self.view.query.page_size,
            search: self.view.query.search_term.clone(),
        };
        debug!(
            entity_type = T::LABEL,
            tag,
            page = params.page,
            search = %params.search,
            "Fetch"
        );
        self.view.state = SyncState::Loading;

        let remote = Arc::clone(remote);
        self.spawn_completion(async move {
            Completion::Fetched {
                tag,
                result: remote.list(params).await,
            }
        });
    }

    fn apply_fetch(&mut self, tag: u64, result: Result<Snapshot<T>, SyncError>, remote: &Remote<T>) {
        if tag != self.latest_tag {
            debug!(
                entity_type = T::LABEL,
                tag,
                latest = self.latest_tag,
                "Stale response discarded"
            );
            return;
        }

        match result {
            Ok(mut snapshot) => {
                let page_size = self.view.query.page_size as usize;
                if snapshot.items.len() > page_size {
                    warn!(
                        entity_type = T::LABEL,
                        received = snapshot.items.len(),
                        page_size,
                        "Oversized page truncated"
                    );
                    snapshot.items.truncate(page_size);
                }
                info!(
                    entity_type = T::LABEL,
                    tag,
                    page = self.view.query.page,
                    items = snapshot.items.len(),
                    total = snapshot.total_count,
                    "Fetched"
                );
                self.view.snapshot = snapshot;
                self.view.state = SyncState::Ready;
                self.snapshot_epoch += 1;
                self.removed_since_fetch.clear();

                let last = self.view.snapshot.last_page();
                if self.view.query.page > last {
                    info!(
                        entity_type = T::LABEL,
                        page = self.view.query.page,
                        last,
                        "Page clamped"
                    );
                    self.view.query.page = last;
                    self.fetch(remote);
                }
            }
            Err(e) => {
                warn!(entity_type = T::LABEL, tag, error = %e, "Fetch failed");
                let fallback = format!("Failed to load {}", T::PLURAL);
                self.view.state = SyncState::Error(e.user_message(&fallback));
            }
        }
    }

    fn remove_optimistically(&mut self, id: T::Id, remote: &Remote<T>) -> Result<(), SyncError> {
        let Some(position) = self
            .view
            .snapshot
            .items
            .iter()
            .position(|item| item.id() == &id)
        else {
            warn!(entity_type = T::LABEL, %id, "Remove of unknown item");
            return Err(SyncError::NotFound(id.to_string()));
        };

        let before = self.view.snapshot.clone();
        self.view.snapshot.items.remove(position);
        self.view.snapshot.total_count = self.view.snapshot.total_count.saturating_sub(1);

        self.next_removal += 1;
        let removal = self.next_removal;
        self.removals.insert(
            removal,
            PendingRemoval {
                id: id.clone(),
                before,
                epoch: self.snapshot_epoch,
            },
        );
        self.removed_since_fetch.push(id.clone());
        self.set_notice(
            NoticeKind::Success,
            format!("{} deleted successfully", T::LABEL),
        );
        info!(entity_type = T::LABEL, %id, removal, "Removed optimistically");

        let remote = Arc::clone(remote);
        self.spawn_completion(async move {
            Completion::Removed {
                removal,
                result: remote.delete(id).await,
            }
        });
        Ok(())
    }

    fn settle_removal(&mut self, removal: u64, result: Result<(), SyncError>, remote: &Remote<T>) {
        let Some(pending) = self.removals.remove(&removal) else {
            return;
        };

        match result {
            Ok(()) => {
                debug!(entity_type = T::LABEL, id = %pending.id, "Remove confirmed");
                if self.config.refresh_after_delete {
                    self.fetch(remote);
                }
            }
            Err(e) => {
                warn!(entity_type = T::LABEL, id = %pending.id, error = %e, "Remove failed, rolling back");
                self.removed_since_fetch.retain(|id| id != &pending.id);

                if pending.epoch == self.snapshot_epoch {
                    let mut restored = pending.before;
                    // Later removals are still in effect.
                    let before_len = restored.items.len();
                    restored
                        .items
                        .retain(|item| !self.removed_since_fetch.contains(item.id()));
                    let dropped = (before_len - restored.items.len()) as u64;
                    restored.total_count = restored.total_count.saturating_sub(dropped);
                    self.view.snapshot = restored;
                } else {
                    debug!(
                        entity_type = T::LABEL,
                        id = %pending.id,
                        "Snapshot replaced since removal, nothing to restore"
                    );
                }

                self.view.notices.success = None;
                let fallback = format!("Failed to delete {}", T::LABEL.to_lowercase());
                self.set_notice(NoticeKind::Error, e.user_message(&fallback));
            }
        }
    }

    /// Restarts the quiescence window; the previous timer, if any, is cancelled.
    fn schedule_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        let delay = self.config.debounce;
        self.debounce = Some(self.spawn_completion(async move {
            tokio::time::sleep(delay).await;
            Completion::DebounceElapsed { generation }
        }));
    }

    fn set_notice(&mut self, kind: NoticeKind, message: String) {
        self.notice_serial += 1;
        let serial = self.notice_serial;
        let ttl = self.config.notice_ttl;
        *self.view.notices.slot_mut(kind) = Some(Notice::new(kind, message, ttl, serial));
        self.spawn_completion(async move {
            tokio::time::sleep(ttl).await;
            Completion::NoticeExpired { kind, serial }
        });
    }

    fn spawn_completion<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Completion<T>> + Send + 'static,
    {
        let sender = self.completion_sender.clone();
        tokio::spawn(async move {
            // The loop is gone after unmount; late results are dropped here.
            let _ = sender.send(task.await);
        })
    }

    /// Publishes the view before replying, so a caller that awaited a command
    /// observes its effect.
    fn ack<R>(&self, respond_to: Response<R>, result: Result<R, SyncError>) {
        self.publish();
        let _ = respond_to.send(result);
    }

    fn publish(&self) {
        self.publisher.send_replace(self.view.clone());
    }
}
