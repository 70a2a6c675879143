//! # Aggregate Loader
//!
//! All-or-nothing loading of several independent endpoints, as a dashboard does when
//! it needs a summary, a trend and two distributions before it can render anything.
//!
//! Every [`Slot`] is fetched concurrently. The published [`AggregateView`] moves to
//! `Loading` before any of them resolves and to `Ready` only once all of them have;
//! the first failure turns the load into `Error` and the other results are thrown
//! away. Slots from the previous successful load stay visible meanwhile.

use crate::framework::error::SyncError;
use crate::framework::state::SyncState;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub type FetchFuture<V> = Pin<Box<dyn Future<Output = Result<V, SyncError>> + Send + 'static>>;

/// A named, zero-argument fetcher.
pub struct Slot<V> {
    name: String,
    fallback: Option<String>,
    fetch: Box<dyn FnOnce() -> FetchFuture<V> + Send + 'static>,
}

impl<V: 'static> Slot<V> {
    pub fn new<F, Fut>(name: impl Into<String>, fetch: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, SyncError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            fallback: None,
            fetch: Box::new(move || Box::pin(fetch()) as FetchFuture<V>),
        }
    }

    /// Message shown when this slot fails without a server message.
    ///
    /// Defaults to `Failed to load {name}`.
    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateView<V> {
    pub state: SyncState,
    slots: Vec<(String, V)>,
}

impl<V> AggregateView<V> {
    pub fn slot(&self, name: &str) -> Option<&V> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, value)| value)
    }

    /// Slots in the order they were requested.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &V)> {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Loader for a fixed set of named slots.
///
/// Loads are tagged like list requests in a
/// [`ResourceSync`](crate::framework::ResourceSync): if `load` is called again before
/// an earlier load finishes, the earlier outcome is discarded.
pub struct AggregateLoader<V> {
    label: String,
    publisher: watch::Sender<AggregateView<V>>,
    latest_tag: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> AggregateLoader<V> {
    /// `label` names what is being loaded (`"dashboard"`, `"report"`) in logs and in
    /// the message shown when a fetch task dies.
    pub fn new(label: impl Into<String>) -> Self {
        let (publisher, _) = watch::channel(AggregateView {
            state: SyncState::Idle,
            slots: Vec::new(),
        });
        Self {
            label: label.into(),
            publisher,
            latest_tag: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn view(&self) -> AggregateView<V> {
        self.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateView<V>> {
        self.publisher.subscribe()
    }

    /// Fetch every slot concurrently and publish the outcome.
    ///
    /// Returns the resulting state, or the state left by a newer load when this one
    /// was superseded.
    pub async fn load(&self, slots: Vec<Slot<V>>) -> SyncState {
        let tag = self.latest_tag.fetch_add(1, Ordering::SeqCst) + 1;
        let count = slots.len();
        self.publisher
            .send_modify(|view| view.state = SyncState::Loading);
        debug!(label = %self.label, tag, slots = count, "Aggregate load");

        let mut tasks = JoinSet::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let Slot {
                name,
                fallback,
                fetch,
            } = slot;
            tasks.spawn(async move {
                let result = fetch().await;
                (index, name, fallback, result)
            });
        }

        let mut results: Vec<Option<(String, V)>> = (0..count).map(|_| None).collect();
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, name, _, Ok(value))) => results[index] = Some((name, value)),
                Ok((_, name, fallback, Err(e))) => {
                    warn!(label = %self.label, tag, slot = %name, error = %e, "Aggregate slot failed");
                    let fallback = fallback.unwrap_or_else(|| format!("Failed to load {name}"));
                    failure = Some(e.user_message(&fallback));
                    break;
                }
                Err(e) => {
                    warn!(label = %self.label, tag, error = %e, "Aggregate slot task failed");
                    failure = Some(format!("Failed to load {}", self.label));
                    break;
                }
            }
        }
        tasks.abort_all();

        let outcome = match failure {
            Some(message) => SyncState::Error(message),
            None => SyncState::Ready,
        };

        let applied = self.publisher.send_if_modified(|view| {
            if self.latest_tag.load(Ordering::SeqCst) != tag {
                return false;
            }
            view.state = outcome.clone();
            if outcome == SyncState::Ready {
                view.slots = results.into_iter().flatten().collect();
            }
            true
        });

        if applied {
            info!(label = %self.label, tag, state = ?outcome, "Aggregate settled");
            outcome
        } else {
            debug!(label = %self.label, tag, "Stale aggregate discarded");
            self.publisher.borrow().state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok_slot(name: &str, value: i64, delay_ms: u64) -> Slot<i64> {
        Slot::new(name, move || async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(value)
        })
    }

    #[tokio::test]
    async fn test_all_slots_ready() {
        let loader = AggregateLoader::new("dashboard");
        let state = loader
            .load(vec![ok_slot("summary", 1, 20), ok_slot("trend", 2, 5)])
            .await;

        assert_eq!(state, SyncState::Ready);
        let view = loader.view();
        assert_eq!(view.slot("summary"), Some(&1));
        assert_eq!(view.slot("trend"), Some(&2));
        let names: Vec<&str> = view.slots().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["summary", "trend"]);
    }

    #[tokio::test]
    async fn test_empty_load_is_ready() {
        let loader: AggregateLoader<i64> = AggregateLoader::new("dashboard");
        assert_eq!(loader.load(Vec::new()).await, SyncState::Ready);
        assert!(loader.view().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_slots() {
        let loader = AggregateLoader::new("dashboard");
        loader.load(vec![ok_slot("summary", 1, 0)]).await;

        let failing = Slot::new("trend", || async {
            Err(SyncError::server(500, "Trend unavailable"))
        });
        let state = loader.load(vec![ok_slot("summary", 9, 0), failing]).await;

        assert_eq!(state, SyncState::Error("Trend unavailable".into()));
        let view = loader.view();
        assert_eq!(view.slot("summary"), Some(&1));
        assert_eq!(view.slot("trend"), None);
    }

    #[tokio::test]
    async fn test_slot_fallback_message() {
        let loader: AggregateLoader<i64> = AggregateLoader::new("report");
        let failing = Slot::new("report", || async { Err(SyncError::Network("reset".into())) })
            .with_fallback("Error generating report");

        let state = loader.load(vec![failing]).await;
        assert_eq!(state, SyncState::Error("Error generating report".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_discarded() {
        let loader = AggregateLoader::new("dashboard");

        // The first load is still in flight when the second one starts and settles.
        let (slow, fast) = tokio::join!(loader.load(vec![ok_slot("a", 1, 50)]), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load(vec![ok_slot("a", 2, 0)]).await
        });

        assert_eq!(fast, SyncState::Ready);
        assert_eq!(slow, SyncState::Ready);
        assert_eq!(loader.view().slot("a"), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_is_discarded() {
        let loader = AggregateLoader::new("dashboard");
        let failing = Slot::new("a", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(SyncError::server(500, "too late"))
        });

        let (slow, _) = tokio::join!(loader.load(vec![failing]), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load(vec![ok_slot("a", 2, 0)]).await
        });

        assert_eq!(slow, SyncState::Ready);
        let view = loader.view();
        assert_eq!(view.state, SyncState::Ready);
        assert_eq!(view.slot("a"), Some(&2));
    }
}
