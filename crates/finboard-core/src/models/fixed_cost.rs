use serde::{Deserialize, Serialize};

/// Recurring cost. The backend has no endpoint for these; they live client-side.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCost {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    pub due_date: String,
}
