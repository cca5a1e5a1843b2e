//! In-memory ledger of transactions, budgets and savings goals
//!
//! One `Ledger` lives for one session. Every collection is create-only:
//! nothing is edited or removed once added. Transactions are kept
//! newest-first; budgets and goals in insertion order.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::ai::ParsedTransaction;
use crate::error::Result;
use crate::models::{
    new_id, Budget, Category, NewBudget, NewSavingsGoal, SavingsGoal, Transaction,
    TransactionType,
};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    savings_goals: Vec<SavingsGoal>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-filled with the demo dataset, dated relative to `now`
    pub fn with_sample_data(now: DateTime<Utc>) -> Self {
        use TransactionType::{Expense, Income};

        let transactions = [
            ("t1", 2, "Coffee Shop", 5.75, Expense, Category::Food),
            ("t2", 3, "Monthly Salary", 3000.0, Income, Category::Income),
            ("t3", 5, "Gas Bill", 75.20, Expense, Category::Utilities),
            ("t4", 6, "Groceries", 124.50, Expense, Category::Food),
        ]
        .into_iter()
        .map(
            |(id, days_ago, description, amount, kind, category)| Transaction {
                id: id.to_string(),
                date: now - Duration::days(days_ago),
                description: description.to_string(),
                amount,
                kind,
                category,
            },
        )
        .collect();

        let budgets = vec![
            Budget {
                id: "b1".into(),
                category: Category::Food,
                limit: 500.0,
            },
            Budget {
                id: "b2".into(),
                category: Category::Entertainment,
                limit: 200.0,
            },
        ];

        let savings_goals = vec![
            SavingsGoal {
                id: "sg1".into(),
                goal_name: "New Laptop".into(),
                target_amount: 1500.0,
                current_amount: 300.0,
            },
            SavingsGoal {
                id: "sg2".into(),
                goal_name: "Vacation".into(),
                target_amount: 2000.0,
                current_amount: 800.0,
            },
        ];

        Self {
            transactions,
            budgets,
            savings_goals,
        }
    }

    /// Record a transaction; it becomes the first (most recent) entry
    pub fn add_transaction(&mut self, transaction: Transaction) {
        debug!(id = %transaction.id, amount = transaction.amount, "Adding transaction");
        self.transactions.insert(0, transaction);
    }

    /// Turn an AI-parsed transaction into a ledger entry
    ///
    /// The gateway only supplies description, amount and category. The
    /// identifier and timestamp are synthesized here, and the direction is
    /// always `Expense`.
    pub fn record_parsed(
        &mut self,
        parsed: ParsedTransaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        let transaction = Transaction::new(
            now,
            parsed.description,
            parsed.amount,
            TransactionType::Expense,
            parsed.category,
        )?;
        self.add_transaction(transaction.clone());
        Ok(transaction)
    }

    pub fn add_budget(&mut self, input: NewBudget) -> Budget {
        let budget = Budget {
            id: new_id("budget"),
            category: input.category,
            limit: input.limit,
        };
        debug!(id = %budget.id, category = %budget.category, "Adding budget");
        self.budgets.push(budget.clone());
        budget
    }

    pub fn add_savings_goal(&mut self, input: NewSavingsGoal) -> SavingsGoal {
        let goal = SavingsGoal {
            id: new_id("goal"),
            goal_name: input.goal_name,
            target_amount: input.target_amount,
            current_amount: 0.0,
        };
        debug!(id = %goal.id, "Adding savings goal");
        self.savings_goals.push(goal.clone());
        goal
    }

    /// Transactions, most recent first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn savings_goals(&self) -> &[SavingsGoal] {
        &self.savings_goals
    }

    /// All budgets for a category (more than one is allowed)
    pub fn budgets_for<'a>(&'a self, category: &'a Category) -> impl Iterator<Item = &'a Budget> {
        self.budgets.iter().filter(move |b| &b.category == category)
    }
}
