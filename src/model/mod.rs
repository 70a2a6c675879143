//! Ledger records implementing the [`SyncEntity`](crate::framework::SyncEntity) trait.

pub mod category;
pub mod transaction;

pub use category::*;
pub use transaction::*;
