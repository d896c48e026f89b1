use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// Canonical transaction, independent of the source template.
///
/// `amount` stays the normalized decimal string all the way to the sink so
/// no binary rounding happens at the currency boundary. `account_id` is
/// written exactly once, by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub email_id: String,
    pub tx_date: DateTime<Utc>,
    pub institution: String,
    /// Label as captured from the email, mask characters included.
    pub account_label: String,
    pub amount: String,
    pub currency: String,
    pub direction: Direction,
    pub description: String,
    /// Filled by a later enrichment stage.
    pub category: String,
    pub user_notes: String,
    pub account_id: Option<i64>,
}
