//! Mock backend for testing
//!
//! Deterministic stand-in for the hosted model. Useful for unit tests and
//! for running the dashboard without an API key (`AI_BACKEND=mock`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::aggregate::category_breakdown;
use crate::error::{Error, Result};
use crate::models::{Category, Transaction};

use super::parsing::INVALID_STRUCTURE;
use super::types::{ParsedTransaction, NO_TRANSACTIONS_MESSAGE};
use super::AIBackend;

/// Mock AI backend for testing
///
/// Call counters are shared between clones so a test can hand a clone to a
/// session and still observe how often the "endpoint" was hit.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fail every call with a transport error
    pub failing: bool,
    parse_calls: Arc<AtomicUsize>,
    summary_calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create a mock whose calls all fail as if the network were down
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
            ..Self::default()
        }
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

/// Pick a category from keywords in the text
fn guess_category(text: &str) -> Category {
    let t = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if has(&["salary", "paycheck", "payroll", "refund"]) {
        Category::Income
    } else if has(&["coffee", "grocer", "lunch", "dinner", "restaurant", "pizza", "trader joe"]) {
        Category::Food
    } else if has(&["uber", "lyft", "taxi", "bus", "train", "fuel", "parking"]) {
        Category::Transport
    } else if has(&["rent", "mortgage"]) {
        Category::Housing
    } else if has(&["movie", "netflix", "concert", "game", "spotify"]) {
        Category::Entertainment
    } else if has(&["electric", "water", "internet", "phone", "gas bill"]) {
        Category::Utilities
    } else if has(&["amazon", "clothes", "shoes", "store"]) {
        Category::Shopping
    } else if has(&["pharmacy", "doctor", "dentist", "gym"]) {
        Category::Health
    } else {
        Category::Other
    }
}

/// First token that reads as a positive amount (`12`, `$4.50`, `56.50,`)
fn find_amount(text: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|w| w.trim_start_matches('$').trim_end_matches(|c: char| !c.is_ascii_digit()))
        .filter_map(|w| w.parse::<f64>().ok())
        .find(|a| *a > 0.0)
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn parse_transaction(&self, input: &str) -> Result<ParsedTransaction> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Transport("mock backend is failing".into()));
        }

        let amount = find_amount(input).ok_or_else(|| Error::Validation(INVALID_STRUCTURE.into()))?;
        let description = input.trim();
        if description.is_empty() {
            return Err(Error::Validation(INVALID_STRUCTURE.into()));
        }

        Ok(ParsedTransaction {
            description: description.to_string(),
            amount,
            category: guess_category(input),
        })
    }

    async fn weekly_summary(&self, transactions: &[Transaction]) -> Result<String> {
        if transactions.is_empty() {
            return Ok(NO_TRANSACTIONS_MESSAGE.to_string());
        }
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Transport("mock backend is failing".into()));
        }

        let mut by_category: Vec<(Category, f64)> =
            category_breakdown(transactions, |t| t.is_expense())
                .into_iter()
                .collect();
        by_category.sort_by(|a, b| b.1.total_cmp(&a.1));

        let spent: f64 = by_category.iter().map(|(_, amount)| amount).sum();
        let mut summary = format!(
            "You recorded {} transactions this week and spent ${:.2}.\n\n**Top categories:**\n",
            transactions.len(),
            spent
        );
        for (category, amount) in by_category.iter().take(3) {
            summary.push_str(&format!("- {}: ${:.2}\n", category, amount));
        }
        summary.push_str("\n**Tip:** Set a small weekly limit for your top category.");

        Ok(summary)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::Utc;

    #[tokio::test]
    async fn test_parse_transaction() {
        let mock = MockBackend::new();
        let parsed = mock
            .parse_transaction("groceries for 56.50 at Trader Joe's")
            .await
            .unwrap();
        assert_eq!(parsed.amount, 56.5);
        assert_eq!(parsed.category, Category::Food);
        assert_eq!(mock.parse_calls(), 1);
    }

    #[tokio::test]
    async fn test_parse_without_amount_fails_validation() {
        let mock = MockBackend::new();
        let err = mock.parse_transaction("bought stuff").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_summary_not_counted() {
        let mock = MockBackend::new();
        let summary = mock.weekly_summary(&[]).await.unwrap();
        assert_eq!(summary, NO_TRANSACTIONS_MESSAGE);
        assert_eq!(mock.summary_calls(), 0);
    }

    #[tokio::test]
    async fn test_summary_lists_top_categories() {
        let mock = MockBackend::new();
        let now = Utc::now();
        let txs: Vec<_> = [
            (Category::Food, 40.0),
            (Category::Transport, 60.0),
            (Category::Shopping, 10.0),
            (Category::Health, 5.0),
        ]
        .into_iter()
        .map(|(c, a)| Transaction::new(now, "x", a, TransactionType::Expense, c).unwrap())
        .collect();

        let summary = mock.weekly_summary(&txs).await.unwrap();
        assert!(summary.contains("- Transport: $60.00\n- Food: $40.00\n- Shopping: $10.00"));
        assert!(!summary.contains("Health"));
        assert_eq!(mock.summary_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(mock.parse_transaction("tea 3").await.unwrap_err().is_transport());
        assert!(!mock.health_check().await);
    }

    #[test]
    fn test_counters_shared_between_clones() {
        let mock = MockBackend::new();
        let clone = mock.clone();
        clone.parse_calls.fetch_add(2, Ordering::SeqCst);
        assert_eq!(mock.parse_calls(), 2);
    }

    #[test]
    fn test_find_amount() {
        assert_eq!(find_amount("coffee $4.50"), Some(4.5));
        assert_eq!(find_amount("paid 12, thanks"), Some(12.0));
        assert_eq!(find_amount("0 then 7"), Some(7.0));
        assert_eq!(find_amount("nothing here"), None);
    }
}
