//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//! Every sync event carries an `entity_type` field (`Transaction`, `Category`), so the
//! module path is hidden (`with_target(false)`) to keep lines short.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Mount, fetch, write and rollback events
//! RUST_LOG=info cargo run
//!
//! # Plus request tags, stale discards and full payloads
//! RUST_LOG=debug cargo run
//!
//! # Only the HTTP layer
//! RUST_LOG=ledger_sync::http=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Sync Lifecycle**: mount, unmount, pending removals at unmount
//! - **Fetches**: issued tag, applied page, stale responses discarded
//! - **Writes**: validation rejections, confirmations, failures
//! - **Optimistic Deletes**: removal, confirmation, rollback
//! - **Auth**: sign-in, logout, 401 invalidation
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**, a search followed by a failed delete:
//!
//! ```text
//! INFO Sync mounted entity_type="Transaction" page_size=10
//! INFO Fetched entity_type="Transaction" tag=1 page=1 items=10 total=42
//! INFO Search committed entity_type="Transaction" search=rent
//! INFO Fetched entity_type="Transaction" tag=2 page=1 items=3 total=3
//! INFO Removed optimistically entity_type="Transaction" id=65f0 removal=1
//! WARN Remove failed, rolling back entity_type="Transaction" id=65f0 error=Server error (500): Database unavailable
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type identifies the source instead
        .compact()
        .init();
}
