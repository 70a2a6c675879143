//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`LedgerSystem`] - Wires the auth gate, the API client and every mirror together
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod ledger_system;
pub mod tracing;

pub use ledger_system::*;
pub use tracing::*;
