//! # Sync Messages
//!
//! Commands sent by a [`SyncHandle`](crate::framework::SyncHandle) to its
//! [`ResourceSync`](crate::framework::ResourceSync), and the completions that
//! background tasks (network calls, timers) post back to the same loop.
//!
//! Every state change of a mirror is the result of exactly one of these messages, so
//! transitions never interleave.

use crate::framework::entity::SyncEntity;
use crate::framework::error::SyncError;
use crate::framework::state::{NoticeKind, Snapshot};
use tokio::sync::oneshot;

/// Type alias for the one-shot acknowledgement channel.
pub type Response<T> = oneshot::Sender<Result<T, SyncError>>;

/// Commands accepted by a `ResourceSync`.
///
/// Each command is acknowledged as soon as its synchronous part has been applied;
/// network outcomes are observed through the published
/// [`SyncView`](crate::framework::SyncView).
#[derive(Debug)]
pub enum SyncRequest<T: SyncEntity> {
    SetSearchTerm {
        raw: String,
        respond_to: Response<()>,
    },
    /// Acknowledged with `true` when a fetch was issued.
    SetPage {
        page: u32,
        respond_to: Response<bool>,
    },
    Refresh {
        respond_to: Response<()>,
    },
    Create {
        params: T::Create,
        respond_to: Response<()>,
    },
    Update {
        id: T::Id,
        params: T::Update,
        respond_to: Response<()>,
    },
    Remove {
        id: T::Id,
        respond_to: Response<()>,
    },
    Unmount {
        respond_to: Response<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteKind {
    Create,
    Update,
}

/// Results delivered back to the actor loop by background tasks.
#[derive(Debug)]
pub(crate) enum Completion<T: SyncEntity> {
    DebounceElapsed {
        generation: u64,
    },
    Fetched {
        tag: u64,
        result: Result<Snapshot<T>, SyncError>,
    },
    Written {
        kind: WriteKind,
        result: Result<T, SyncError>,
    },
    Removed {
        removal: u64,
        result: Result<(), SyncError>,
    },
    NoticeExpired {
        kind: NoticeKind,
        serial: u64,
    },
}
