use crate::auth::{AuthError, AuthGate, FileTokenStore, MemoryTokenStore};
use crate::config::{AppConfig, SyncConfig};
use crate::framework::{AggregateLoader, ResourceSync, SyncError, SyncHandle, SyncState};
use crate::http::{
    daily_summary, dashboard_slots, report_slot, ApiClient, HttpCollection, ListShape, ReportQuery,
};
use crate::model::{Category, Transaction};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Categories come back unpaginated; the mirror holds up to this many.
pub const CATEGORY_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] SyncError),

    #[error("Sync task failed: {0}")]
    TaskFailed(String),
}

/// The runtime orchestrator for the ledger's synchronization layer.
///
/// `LedgerSystem` is responsible for:
/// - **Lifecycle Management**: Mounting and unmounting every `ResourceSync`
/// - **Dependency Wiring**: One `AuthGate`, one `ApiClient`, shared by every collection
/// - **Aggregate Loading**: The dashboard's all-or-nothing load, and reports
///
/// # Example
///
/// ```ignore
/// let system = LedgerSystem::new(&AppConfig::load(path)?)?;
///
/// system.transactions.set_search_term("rent").await?;
/// system.load_dashboard().await;
///
/// system.shutdown().await?;
/// ```
pub struct LedgerSystem {
    pub auth: Arc<AuthGate>,
    pub api: Arc<ApiClient>,

    /// Mirror of `/transactions`, paginated and searchable.
    pub transactions: SyncHandle<Transaction>,

    /// Mirror of `/categories`.
    pub categories: SyncHandle<Category>,

    pub dashboard: AggregateLoader<serde_json::Value>,

    /// The last generated report, under [`REPORT`](crate::http::reports::REPORT).
    pub reports: AggregateLoader<serde_json::Value>,

    /// Task handles for the mounted syncs (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl LedgerSystem {
    /// Restores the session from the configured token store and mounts every mirror.
    ///
    /// Without `api.token_file` the session lives in memory only.
    pub fn new(config: &AppConfig) -> Result<Self, SystemError> {
        let auth = match &config.api.token_file {
            Some(path) => AuthGate::load(FileTokenStore::new(path))?,
            None => AuthGate::load(MemoryTokenStore::new())?,
        };
        Self::with_auth(config, auth)
    }

    /// Mounts every mirror against an existing auth gate.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_auth(config: &AppConfig, auth: Arc<AuthGate>) -> Result<Self, SystemError> {
        let api = Arc::new(ApiClient::new(&config.api, Arc::clone(&auth))?);

        // 1. Create syncs
        let (transaction_sync, transactions) = ResourceSync::<Transaction>::new(config.sync.clone());
        let (category_sync, categories) = ResourceSync::<Category>::new(SyncConfig {
            page_size: CATEGORY_PAGE_SIZE,
            ..config.sync.clone()
        });

        // 2. Mount them on their collections
        let transaction_handle = tokio::spawn(transaction_sync.run(HttpCollection::new(
            Arc::clone(&api),
            "transactions",
            ListShape::Paged {
                items_key: "transactions",
            },
        )));
        let category_handle = tokio::spawn(category_sync.run(HttpCollection::new(
            Arc::clone(&api),
            "categories",
            ListShape::Bare,
        )));

        info!(base_url = %api.base_url(), "Ledger system started");
        Ok(Self {
            auth,
            api,
            transactions,
            categories,
            dashboard: AggregateLoader::new("dashboard"),
            reports: AggregateLoader::new("report"),
            handles: vec![transaction_handle, category_handle],
        })
    }

    /// Loads every dashboard panel; see [`AggregateLoader::load`].
    pub async fn load_dashboard(&self) -> SyncState {
        self.dashboard.load(dashboard_slots(&self.api)).await
    }

    /// Generates `query`, replacing the previous report once it succeeds.
    ///
    /// An invalid query is rejected before anything is sent.
    pub async fn load_report(&self, query: ReportQuery) -> Result<SyncState, SyncError> {
        query.validate()?;
        Ok(self.reports.load(vec![report_slot(&self.api, query)]).await)
    }

    pub async fn daily_summary(&self, date: &str) -> Result<serde_json::Value, SyncError> {
        daily_summary(&self.api, date).await
    }

    /// Gracefully shuts down every mirror.
    ///
    /// Each sync is unmounted explicitly, so responses still in flight are dropped
    /// rather than applied, then its task is awaited.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down ledger system...");

        // =====================================================================
        // Step 1: Unmount every sync
        // =====================================================================

        // An already-closed sync reports Closed, which is what we want anyway.
        let _ = self.transactions.unmount().await;
        let _ = self.categories.unmount().await;
        drop(self.transactions);
        drop(self.categories);

        // =====================================================================
        // Step 2: Wait for all sync tasks to complete
        // =====================================================================

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Sync task failed: {:?}", e);
                return Err(SystemError::TaskFailed(format!("{e:?}")));
            }
        }

        info!("Ledger system shutdown complete.");
        Ok(())
    }
}
