//! Domain models for Pennywise

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Spending category
///
/// The nine fixed categories the dashboard offers, plus `Custom` for
/// free text that came back from the AI and matched none of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Food,
    Transport,
    Housing,
    Entertainment,
    Utilities,
    Shopping,
    Health,
    Income,
    Other,
    Custom(String),
}

impl Category {
    /// The fixed categories, in display order
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Entertainment,
        Category::Utilities,
        Category::Shopping,
        Category::Health,
        Category::Income,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Housing => "Housing",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Income => "Income",
            Self::Other => "Other",
            Self::Custom(name) => name,
        }
    }

    /// Categories a budget may be set for (everything but `Income`)
    pub fn budgetable() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| *c != Category::Income)
    }

    /// Fixed categories other than `Income`; `Custom` names never qualify
    pub fn is_budgetable(&self) -> bool {
        self.is_known() && *self != Category::Income
    }

    /// Whether this is one of the nine fixed categories
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Coerce free text into a category
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Anything else is kept verbatim (trimmed) as `Custom`.
    pub fn coerce(name: &str) -> Self {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| Self::Custom(trimmed.to_string()))
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::coerce(s))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self::coerce(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry
///
/// Amounts are always positive; the direction lives in `kind`.
/// Deserialization applies the same amount check as `Transaction::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: Category,
}

impl Transaction {
    /// Create a transaction with a fresh identifier
    pub fn new(
        date: DateTime<Utc>,
        description: impl Into<String>,
        amount: f64,
        kind: TransactionType,
        category: Category,
    ) -> Result<Self> {
        validate_positive("amount", amount)?;
        Ok(Self {
            id: new_id("trans"),
            date,
            description: description.into(),
            amount,
            kind,
            category,
        })
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

/// Unchecked wire form of `Transaction`
#[derive(Deserialize)]
struct TransactionRecord {
    id: String,
    date: DateTime<Utc>,
    description: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: Category,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = Error;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        validate_positive("amount", record.amount)?;
        Ok(Self {
            id: record.id,
            date: record.date,
            description: record.description,
            amount: record.amount,
            kind: record.kind,
            category: record.category,
        })
    }
}

/// Input for creating a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    pub category: Category,
    pub limit: f64,
}

impl NewBudget {
    /// Form-level checks: positive limit, no budget on `Income`
    pub fn validate(&self) -> Result<()> {
        validate_positive("limit", self.limit)?;
        if !self.category.is_budgetable() {
            return Err(Error::InvalidData(format!(
                "Cannot set a budget for category {}",
                self.category
            )));
        }
        Ok(())
    }
}

/// Spending limit for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category: Category,
    pub limit: f64,
}

/// Input for creating a savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavingsGoal {
    pub goal_name: String,
    pub target_amount: f64,
}

impl NewSavingsGoal {
    pub fn validate(&self) -> Result<()> {
        if self.goal_name.trim().is_empty() {
            return Err(Error::InvalidData("Goal name is required".into()));
        }
        validate_positive("target amount", self.target_amount)
    }
}

/// A savings target; `current_amount` is never moved by ledger activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    pub goal_name: String,
    pub target_amount: f64,
    pub current_amount: f64,
}

/// Generate a prefixed unique identifier (e.g. `budget-6f1c...`)
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn validate_positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_coerce_known() {
        assert_eq!(Category::coerce("food"), Category::Food);
        assert_eq!(Category::coerce("  Transport "), Category::Transport);
        assert_eq!(Category::coerce("INCOME"), Category::Income);
    }

    #[test]
    fn test_category_coerce_custom() {
        assert_eq!(
            Category::coerce(" Pet Supplies "),
            Category::Custom("Pet Supplies".into())
        );
        assert!(!Category::coerce("Pets").is_known());
    }

    #[test]
    fn test_category_serde_as_string() {
        let json = serde_json::to_string(&Category::Entertainment).unwrap();
        assert_eq!(json, "\"Entertainment\"");

        let custom: Category = serde_json::from_str("\"Gifts\"").unwrap();
        assert_eq!(custom, Category::Custom("Gifts".into()));
        assert_eq!(serde_json::to_string(&custom).unwrap(), "\"Gifts\"");
    }

    #[test]
    fn test_budgetable_excludes_income() {
        let cats: Vec<_> = Category::budgetable().collect();
        assert_eq!(cats.len(), 8);
        assert!(!cats.contains(&Category::Income));
    }

    #[test]
    fn test_transaction_rejects_non_positive_amount() {
        let now = Utc::now();
        assert!(Transaction::new(now, "Refund", 0.0, TransactionType::Expense, Category::Other)
            .is_err());
        assert!(
            Transaction::new(now, "Refund", -3.0, TransactionType::Expense, Category::Other)
                .is_err()
        );
        assert!(Transaction::new(
            now,
            "Broken",
            f64::NAN,
            TransactionType::Expense,
            Category::Other
        )
        .is_err());
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction::new(
            Utc::now(),
            "Coffee Shop",
            5.75,
            TransactionType::Expense,
            Category::Food,
        )
        .unwrap();
        assert!(tx.id.starts_with("trans-"));

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["amount"], 5.75);
    }

    #[test]
    fn test_new_budget_validate() {
        let ok = NewBudget {
            category: Category::Food,
            limit: 500.0,
        };
        assert!(ok.validate().is_ok());

        let income = NewBudget {
            category: Category::Income,
            limit: 500.0,
        };
        assert!(income.validate().is_err());

        let zero = NewBudget {
            category: Category::Food,
            limit: 0.0,
        };
        assert!(zero.validate().is_err());

        let custom = NewBudget {
            category: Category::Custom("Pets".into()),
            limit: 50.0,
        };
        assert!(custom.validate().is_err());
    }

    #[test]
    fn test_is_budgetable_rejects_custom() {
        assert!(Category::Food.is_budgetable());
        assert!(!Category::Income.is_budgetable());
        assert!(!Category::Custom("Pets".into()).is_budgetable());
    }

    #[test]
    fn test_transaction_deserialize_checks_amount() {
        let json = |amount: &str| {
            format!(
                r#"{{"id":"trans-1","date":"2024-03-07T12:00:00Z","description":"Tea","amount":{},"type":"expense","category":"Food"}}"#,
                amount
            )
        };

        let tx: Transaction = serde_json::from_str(&json("3.5")).unwrap();
        assert_eq!(tx.amount, 3.5);
        assert_eq!(tx.kind, TransactionType::Expense);

        assert!(serde_json::from_str::<Transaction>(&json("0")).is_err());
        assert!(serde_json::from_str::<Transaction>(&json("-2")).is_err());
    }

    #[test]
    fn test_new_goal_validate() {
        let goal = NewSavingsGoal {
            goal_name: "Bike".into(),
            target_amount: 400.0,
        };
        assert!(goal.validate().is_ok());

        let unnamed = NewSavingsGoal {
            goal_name: "  ".into(),
            target_amount: 400.0,
        };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_savings_goal_camel_case() {
        let goal = SavingsGoal {
            id: "goal-1".into(),
            goal_name: "Vacation".into(),
            target_amount: 2000.0,
            current_amount: 800.0,
        };
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["goalName"], "Vacation");
        assert_eq!(json["targetAmount"], 2000.0);
        assert_eq!(json["currentAmount"], 800.0);
    }

    #[test]
    fn test_transaction_type_from_str() {
        assert_eq!(
            "Expense".parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
    }
}
