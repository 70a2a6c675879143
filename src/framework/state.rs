//! # Sync State
//!
//! Plain data published by a [`ResourceSync`](crate::framework::ResourceSync) after
//! every transition: the current [`Query`], the mirrored [`Snapshot`], the
//! [`SyncState`] and the transient [`Notice`]s.

use std::time::Duration;
use tokio::time::Instant;

/// What the mirror currently asks the server for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Committed (debounced) search term.
    pub search_term: String,
}

impl Query {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search_term: String::new(),
        }
    }
}

/// One page of a server-owned collection.
///
/// A snapshot is replaced wholesale on every successful fetch; it is never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Snapshot<T> {
    pub fn new(items: Vec<T>, total_count: u64, total_pages: u32) -> Self {
        Self {
            items,
            total_count,
            total_pages,
        }
    }

    /// Highest page that may be requested.
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0, 0)
    }
}

/// Lifecycle state of a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

impl SyncState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Instant,
    pub(crate) serial: u64,
}

impl Notice {
    pub(crate) fn new(kind: NoticeKind, message: String, ttl: Duration, serial: u64) -> Self {
        Self {
            kind,
            message,
            expires_at: Instant::now() + ttl,
            serial,
        }
    }

    pub fn is_active(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// At most one notice per kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notices {
    pub(crate) success: Option<Notice>,
    pub(crate) error: Option<Notice>,
}

impl Notices {
    pub(crate) fn slot_mut(&mut self, kind: NoticeKind) -> &mut Option<Notice> {
        match kind {
            NoticeKind::Success => &mut self.success,
            NoticeKind::Error => &mut self.error,
        }
    }

    /// The notice of `kind`, if it hasn't expired yet.
    pub fn get(&self, kind: NoticeKind) -> Option<&Notice> {
        let slot = match kind {
            NoticeKind::Success => &self.success,
            NoticeKind::Error => &self.error,
        };
        slot.as_ref().filter(|notice| notice.is_active())
    }
}

/// Everything a presentation layer needs to render one mirrored collection.
#[derive(Debug, Clone)]
pub struct SyncView<T> {
    pub query: Query,
    /// Raw search input as typed, before the debounce commits it.
    pub search_input: String,
    pub snapshot: Snapshot<T>,
    pub state: SyncState,
    pub notices: Notices,
}

impl<T> SyncView<T> {
    pub(crate) fn new(query: Query) -> Self {
        Self {
            query,
            search_input: String::new(),
            snapshot: Snapshot::default(),
            state: SyncState::Idle,
            notices: Notices::default(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.snapshot.items
    }

    pub fn success_notice(&self) -> Option<&Notice> {
        self.notices.get(NoticeKind::Success)
    }

    pub fn error_notice(&self) -> Option<&Notice> {
        self.notices.get(NoticeKind::Error)
    }
}
