//! # ledger-sync demo
//!
//! Mounts the transaction and category mirrors against a running ledger API, prints
//! the first page, loads the dashboard and shuts down.
//!
//! ```bash
//! LEDGER_API_URL=http://localhost:5002/api \
//! LEDGER_EMAIL=asha@example.com LEDGER_PASSWORD=secret \
//! RUST_LOG=info cargo run -- ledger.toml
//! ```

use ledger_sync::config::AppConfig;
use ledger_sync::framework::SyncState;
use ledger_sync::http::LoginRequest;
use ledger_sync::lifecycle::{setup_tracing, LedgerSystem};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

const READY_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ledger.toml"));
    let config = AppConfig::load(&path)
        .and_then(AppConfig::apply_env)
        .map_err(|e| e.to_string())?;

    info!(config = %path.display(), "Starting ledger sync");
    let system = LedgerSystem::new(&config).map_err(|e| e.to_string())?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("LEDGER_EMAIL"),
        std::env::var("LEDGER_PASSWORD"),
    ) {
        let span = tracing::info_span!("login");
        let login = async { system.api.login(&LoginRequest { email, password }).await }
            .instrument(span)
            .await;
        match login {
            Ok(_) => {
                // The initial fetch may have gone out without a token
                let _ = system.transactions.refresh().await;
                let _ = system.categories.refresh().await;
            }
            Err(e) => warn!(error = %e, "Login failed"),
        }
    }

    let settled = tokio::time::timeout(
        READY_TIMEOUT,
        system
            .transactions
            .wait_for(|view| matches!(view.state, SyncState::Ready | SyncState::Error(_))),
    )
    .await;

    match settled {
        Ok(Ok(view)) => match &view.state {
            SyncState::Error(message) => error!(%message, "Transactions failed to load"),
            _ => {
                info!(
                    page = view.query.page,
                    total = view.snapshot.total_count,
                    pages = view.snapshot.last_page(),
                    "Transactions loaded"
                );
                for transaction in view.items() {
                    info!(
                        id = %transaction.id,
                        date = %transaction.date,
                        amount = transaction.amount,
                        category = %transaction.category,
                        "Transaction"
                    );
                }
            }
        },
        Ok(Err(e)) => error!(error = %e, "Transaction sync closed"),
        Err(_) => warn!("Timed out waiting for transactions"),
    }

    let categories = system.categories.view();
    info!(count = categories.items().len(), "Categories in mirror");

    match system.load_dashboard().await {
        SyncState::Ready => {
            for (slot, value) in system.dashboard.view().slots() {
                info!(slot, %value, "Dashboard panel");
            }
        }
        state => warn!(?state, "Dashboard not loaded"),
    }

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Ledger sync finished");
    Ok(())
}
