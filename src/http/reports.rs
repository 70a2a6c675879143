//! # Reports
//!
//! Report queries and the daily transaction summary. Each is a single JSON fetch;
//! reports are loaded through an [`AggregateLoader`](crate::framework::AggregateLoader)
//! so they share the Loading / Ready / Error lifecycle of the dashboard.
//!
//! | Query | Request |
//! |-------|---------|
//! | [`ReportQuery::Monthly`] | `GET /reports/monthly?year=&month=` |
//! | [`ReportQuery::Vendor`] | `GET /reports/vendor?vendor=` |
//! | [`ReportQuery::Category`] | `GET /reports/category?category=` |
//! | [`daily_summary`] | `GET /transactions/summary/daily?date=` |

use crate::framework::{Slot, SyncError};
use crate::http::client::ApiClient;
use std::sync::Arc;

/// Slot name under which a report is published.
pub const REPORT: &str = "report";

/// One of the server-side reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportQuery {
    /// Totals for one calendar month; `month` is 1-based.
    Monthly { year: i32, month: u32 },
    Vendor { vendor: String },
    Category { category: String },
}

impl ReportQuery {
    /// Parses a `YYYY-MM` month, as entered in a month picker.
    pub fn monthly(year_month: &str) -> Result<Self, SyncError> {
        let invalid = || SyncError::Validation(format!("Invalid month: {year_month}"));
        let (year, month) = year_month.trim().split_once('-').ok_or_else(invalid)?;
        let query = Self::Monthly {
            year: year.parse().map_err(|_| invalid())?,
            month: month.parse().map_err(|_| invalid())?,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Monthly { .. } => "reports/monthly",
            Self::Vendor { .. } => "reports/vendor",
            Self::Category { .. } => "reports/category",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Monthly { year, month } => {
                vec![("year", year.to_string()), ("month", format!("{month:02}"))]
            }
            Self::Vendor { vendor } => vec![("vendor", vendor.trim().to_string())],
            Self::Category { category } => vec![("category", category.trim().to_string())],
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        match self {
            Self::Monthly { month, .. } if !(1..=12).contains(month) => Err(
                SyncError::Validation(format!("Month must be between 1 and 12, got {month}")),
            ),
            Self::Vendor { vendor } if vendor.trim().is_empty() => {
                Err(SyncError::Validation("Vendor is required".into()))
            }
            Self::Category { category } if category.trim().is_empty() => {
                Err(SyncError::Validation("Category is required".into()))
            }
            _ => Ok(()),
        }
    }
}

/// The single slot that fetches `query`.
pub fn report_slot(client: &Arc<ApiClient>, query: ReportQuery) -> Slot<serde_json::Value> {
    let client = Arc::clone(client);
    Slot::new(REPORT, move || async move {
        client
            .get_json::<_, serde_json::Value>(query.path(), &query.params())
            .await
    })
    .with_fallback("Error generating report")
}

/// Totals of the transactions recorded on `date` (`YYYY-MM-DD`).
pub async fn daily_summary(
    client: &ApiClient,
    date: &str,
) -> Result<serde_json::Value, SyncError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(SyncError::Validation("Date is required".into()));
    }
    client
        .get_json("transactions/summary/daily", &[("date", date)])
        .await
}
