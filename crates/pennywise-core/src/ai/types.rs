//! AI gateway request/response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, Transaction, TransactionType};

/// Returned by the summary gateway when there is nothing to summarize
pub const NO_TRANSACTIONS_MESSAGE: &str = "You have no transactions in the last week.";

/// Transaction fields extracted from free text
///
/// The gateway never decides direction, identifier or timestamp; the
/// ledger fills those in when the result is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub description: String,
    pub amount: f64,
    pub category: Category,
}

/// Transaction as sent to the summary endpoint (identifier omitted)
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord<'a> {
    pub description: &'a str,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: &'a Category,
    pub date: DateTime<Utc>,
}

impl<'a> From<&'a Transaction> for SummaryRecord<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            description: &t.description,
            amount: t.amount,
            kind: t.kind,
            category: &t.category,
            date: t.date,
        }
    }
}

/// Serialize transactions for the summary prompt
///
/// Returns `None` for an empty slice so callers can skip the network call.
pub fn summary_payload(transactions: &[Transaction]) -> serde_json::Result<Option<String>> {
    if transactions.is_empty() {
        return Ok(None);
    }
    let records: Vec<SummaryRecord<'_>> = transactions.iter().map(SummaryRecord::from).collect();
    serde_json::to_string(&records).map(Some)
}
