//! reqwest-backed access to the ledger REST API.

pub mod client;
pub mod collection;
pub mod dashboard;
pub mod reports;

pub use client::{
    ApiClient, LoginRequest, Payload, ProfileUpdate, SessionError, SignupRequest, NO_QUERY,
};
pub use collection::{HttpCollection, ListShape};
pub use dashboard::dashboard_slots;
pub use reports::{daily_summary, report_slot, ReportQuery};
