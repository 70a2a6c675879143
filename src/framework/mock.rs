//! # Mock Remotes & Testing Guide
//!
//! Two in-memory [`RemoteCollection`] implementations for exercising a
//! [`ResourceSync`](crate::framework::ResourceSync) without a server.
//!
//! ## When to use which
//!
//! | Feature | MockRemote | ChannelRemote |
//! |---------|------------|---------------|
//! | **Responses** | Scripted up front (`expect_*`) | Sent by the test, one by one |
//! | **Timing** | Immediate | Whenever the test answers |
//! | **Use Case** | Happy paths, error injection | Races, stale responses, rollback |
//!
//! <details>
//! <summary><b>Pattern 1: Scripted responses</b></summary>
//!
//! ```rust,ignore
//! let mut mock = MockRemote::<Transaction>::new();
//! mock.expect_list().return_ok(Snapshot::new(items, 25, 3));
//! mock.expect_delete().return_err(SyncError::server(500, "Database unavailable"));
//!
//! let (sync, handle) = ResourceSync::new(SyncConfig::default());
//! tokio::spawn(sync.run(mock.clone()));
//! // ...
//! mock.verify(); // Ensures all expectations were met
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Pattern 2: Test-controlled ordering</b></summary>
//!
//! ```rust,ignore
//! let (remote, mut receiver) = create_mock_remote::<Transaction>(10);
//! tokio::spawn(sync.run(remote));
//!
//! let (first, reply_first) = expect_list(&mut receiver).await.unwrap();
//! handle.refresh().await?;
//! let (second, reply_second) = expect_list(&mut receiver).await.unwrap();
//!
//! // Answer out of order: the older response must be discarded.
//! reply_second.send(Ok(page_two)).unwrap();
//! reply_first.send(Ok(page_one)).unwrap();
//! ```
//! </details>

use crate::framework::entity::SyncEntity;
use crate::framework::error::SyncError;
use crate::framework::remote::{ListParams, RemoteCollection};
use crate::framework::state::Snapshot;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected call on the mock remote.
enum Expectation<T: SyncEntity> {
    List {
        response: Result<Snapshot<T>, SyncError>,
    },
    Create {
        response: Result<T, SyncError>,
    },
    Update {
        response: Result<T, SyncError>,
    },
    Delete {
        response: Result<(), SyncError>,
    },
}

impl<T: SyncEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// A call received by a mock remote.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall<Id> {
    List(ListParams),
    Create,
    Update(Id),
    Delete(Id),
}

struct MockState<T: SyncEntity> {
    expectations: VecDeque<Expectation<T>>,
    calls: Vec<RecordedCall<T::Id>>,
}

/// A scripted remote with expectation tracking.
///
/// Expectations are consumed in order; a call that doesn't match the next expectation
/// panics. Cloning shares the script, so keep one clone for `verify()`.
pub struct MockRemote<T: SyncEntity> {
    state: Arc<Mutex<MockState<T>>>,
}

impl<T: SyncEntity> Clone for MockRemote<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: SyncEntity> Default for MockRemote<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SyncEntity> MockRemote<T> {
    /// Creates a new mock remote with no expectations.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Expects a `list` call.
    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Snapshot<T>> {
        self.builder(|response| Expectation::List { response })
    }

    /// Expects a `create` call.
    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(|response| Expectation::Create { response })
    }

    /// Expects an `update` call.
    pub fn expect_update(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(|response| Expectation::Update { response })
    }

    /// Expects a `delete` call.
    pub fn expect_delete(&mut self) -> ExpectationBuilder<T, ()> {
        self.builder(|response| Expectation::Delete { response })
    }

    fn builder<R>(
        &mut self,
        wrap: fn(Result<R, SyncError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            state: self.state.clone(),
            wrap,
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall<T::Id>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Parameters of every `list` call received so far.
    pub fn list_calls(&self) -> Vec<ListParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::List(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn next(&self, call: RecordedCall<T::Id>) -> Expectation<T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        match state.expectations.pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected call {call:?}: no expectations left"),
        }
    }
}

#[async_trait]
impl<T: SyncEntity> RemoteCollection<T> for MockRemote<T> {
    async fn list(&self, params: ListParams) -> Result<Snapshot<T>, SyncError> {
        match self.next(RecordedCall::List(params)) {
            Expectation::List { response } => response,
            other => panic!("Expected {} but got list", other.name()),
        }
    }

    async fn create(&self, _params: T::Create) -> Result<T, SyncError> {
        match self.next(RecordedCall::Create) {
            Expectation::Create { response } => response,
            other => panic!("Expected {} but got create", other.name()),
        }
    }

    async fn update(&self, id: T::Id, _params: T::Update) -> Result<T, SyncError> {
        match self.next(RecordedCall::Update(id)) {
            Expectation::Update { response } => response,
            other => panic!("Expected {} but got update", other.name()),
        }
    }

    async fn delete(&self, id: T::Id) -> Result<(), SyncError> {
        match self.next(RecordedCall::Delete(id)) {
            Expectation::Delete { response } => response,
            other => panic!("Expected {} but got delete", other.name()),
        }
    }
}

/// Builder for a single expectation.
pub struct ExpectationBuilder<T: SyncEntity, R> {
    state: Arc<Mutex<MockState<T>>>,
    wrap: fn(Result<R, SyncError>) -> Expectation<T>,
}

impl<T: SyncEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: SyncError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, SyncError>) {
        let mut state = self.state.lock().unwrap();
        state.expectations.push_back((self.wrap)(response));
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

pub type Responder<R> = oneshot::Sender<Result<R, SyncError>>;

/// A request forwarded by a [`ChannelRemote`] to the test.
#[derive(Debug)]
pub enum RemoteRequest<T: SyncEntity> {
    List {
        params: ListParams,
        respond_to: Responder<Snapshot<T>>,
    },
    Create {
        params: T::Create,
        respond_to: Responder<T>,
    },
    Update {
        id: T::Id,
        params: T::Update,
        respond_to: Responder<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Responder<()>,
    },
}

/// A remote whose every call is answered by the test through a channel.
///
/// A dropped responder is reported to the sync as a network error.
pub struct ChannelRemote<T: SyncEntity> {
    sender: mpsc::Sender<RemoteRequest<T>>,
}

impl<T: SyncEntity> ChannelRemote<T> {
    async fn call<R>(
        &self,
        build: impl FnOnce(Responder<R>) -> RemoteRequest<T>,
    ) -> Result<R, SyncError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| SyncError::Network("mock remote closed".into()))?;
        response
            .await
            .map_err(|_| SyncError::Network("mock responder dropped".into()))?
    }
}

#[async_trait]
impl<T: SyncEntity> RemoteCollection<T> for ChannelRemote<T> {
    async fn list(&self, params: ListParams) -> Result<Snapshot<T>, SyncError> {
        self.call(|respond_to| RemoteRequest::List { params, respond_to })
            .await
    }

    async fn create(&self, params: T::Create) -> Result<T, SyncError> {
        self.call(|respond_to| RemoteRequest::Create { params, respond_to })
            .await
    }

    async fn update(&self, id: T::Id, params: T::Update) -> Result<T, SyncError> {
        self.call(|respond_to| RemoteRequest::Update {
            id,
            params,
            respond_to,
        })
        .await
    }

    async fn delete(&self, id: T::Id) -> Result<(), SyncError> {
        self.call(|respond_to| RemoteRequest::Delete { id, respond_to })
            .await
    }
}

/// Creates a channel remote and the receiver the test answers from.
///
/// # Testing Strategy
/// Races are hard to reproduce against a real server. Here every request parks until
/// the test replies, so a test can hold two list requests and answer them in reverse
/// order, or fail a delete after asserting the optimistic state.
pub fn create_mock_remote<T: SyncEntity>(
    buffer_size: usize,
) -> (ChannelRemote<T>, mpsc::Receiver<RemoteRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelRemote { sender }, receiver)
}

/// Helper to verify that the next request is a List request
pub async fn expect_list<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<RemoteRequest<T>>,
) -> Option<(ListParams, Responder<Snapshot<T>>)> {
    match receiver.recv().await {
        Some(RemoteRequest::List { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next request is a Create request
pub async fn expect_create<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<RemoteRequest<T>>,
) -> Option<(T::Create, Responder<T>)> {
    match receiver.recv().await {
        Some(RemoteRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next request is a Delete request
pub async fn expect_delete<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<RemoteRequest<T>>,
) -> Option<(T::Id, Responder<()>)> {
    match receiver.recv().await {
        Some(RemoteRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}
