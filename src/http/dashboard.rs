//! Dashboard endpoints, loaded together through an
//! [`AggregateLoader`](crate::framework::AggregateLoader).

use crate::framework::Slot;
use crate::http::client::{ApiClient, NO_QUERY};
use std::sync::Arc;

pub const SUMMARY: &str = "summary";
pub const TREND: &str = "trend";
pub const CATEGORY_DISTRIBUTION: &str = "categoryDistribution";
pub const MONTHLY_COMPARISON: &str = "monthlyComparison";

/// Slot name and endpoint of every dashboard panel.
pub const ENDPOINTS: [(&str, &str); 4] = [
    (SUMMARY, "dashboard/summary"),
    (TREND, "dashboard/trend"),
    (CATEGORY_DISTRIBUTION, "dashboard/category-distribution"),
    (MONTHLY_COMPARISON, "dashboard/monthly-comparison"),
];

/// One slot per dashboard panel, each fetching raw JSON.
pub fn dashboard_slots(client: &Arc<ApiClient>) -> Vec<Slot<serde_json::Value>> {
    ENDPOINTS
        .iter()
        .map(|&(name, path)| {
            let client = Arc::clone(client);
            Slot::new(name, move || async move {
                client
                    .get_json::<_, serde_json::Value>(path, &NO_QUERY)
                    .await
            })
        })
        .collect()
}
