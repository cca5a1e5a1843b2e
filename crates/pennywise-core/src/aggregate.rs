//! Derived views over the ledger
//!
//! Everything here is a pure function of the slices it is given: monthly
//! income/expense totals, per-category breakdowns, budget utilization and
//! goal progress. Nothing is cached or stored. An empty input produces
//! zeroed aggregates rather than an error.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};
use serde::Serialize;

use crate::ledger::Ledger;
use crate::models::{Budget, Category, SavingsGoal, Transaction, TransactionType};

/// Utilization above this percentage is flagged as a warning
pub const WARNING_THRESHOLD_PERCENT: f64 = 75.0;

/// Utilization above this percentage is over budget
pub const OVER_BUDGET_THRESHOLD_PERCENT: f64 = 100.0;

/// Income and expense sums for one calendar month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

/// Sum income and expense for a calendar month in local time
pub fn monthly_totals(transactions: &[Transaction], year: i32, month: u32) -> MonthlyTotals {
    monthly_totals_in(transactions, year, month, &Local)
}

/// Sum income and expense for a calendar month as seen from `tz`
pub fn monthly_totals_in<Tz: TimeZone>(
    transactions: &[Transaction],
    year: i32,
    month: u32,
    tz: &Tz,
) -> MonthlyTotals {
    transactions
        .iter()
        .filter(|t| in_month(&t.date, year, month, tz))
        .fold(MonthlyTotals::default(), |mut totals, t| {
            match t.kind {
                TransactionType::Income => totals.income += t.amount,
                TransactionType::Expense => totals.expense += t.amount,
            }
            totals
        })
}

/// Group matching transactions by category and sum their amounts
pub fn category_breakdown<P>(transactions: &[Transaction], predicate: P) -> BTreeMap<Category, f64>
where
    P: Fn(&Transaction) -> bool,
{
    let mut totals = BTreeMap::new();
    for t in transactions.iter().filter(|t| predicate(t)) {
        *totals.entry(t.category.clone()).or_insert(0.0) += t.amount;
    }
    totals
}

/// Expense totals per category for one calendar month
///
/// This is what budgets are measured against.
pub fn monthly_expenses_by_category_in<Tz: TimeZone>(
    transactions: &[Transaction],
    year: i32,
    month: u32,
    tz: &Tz,
) -> BTreeMap<Category, f64> {
    category_breakdown(transactions, |t| {
        t.is_expense() && in_month(&t.date, year, month, tz)
    })
}

/// Traffic-light classification of a budget's utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// 75% or less
    OnTrack,
    /// Above 75%, up to and including 100%
    Warning,
    /// Above 100%
    OverBudget,
}

impl BudgetStatus {
    /// Classify an unclamped utilization percentage
    pub fn from_percent(percent: f64) -> Self {
        if percent > OVER_BUDGET_THRESHOLD_PERCENT {
            Self::OverBudget
        } else if percent > WARNING_THRESHOLD_PERCENT {
            Self::Warning
        } else {
            Self::OnTrack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Warning => "warning",
            Self::OverBudget => "over_budget",
        }
    }

    /// Bar color used by the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            Self::OnTrack => "green",
            Self::Warning => "yellow",
            Self::OverBudget => "red",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of a budget has been spent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUtilization {
    pub budget_id: String,
    pub category: Category,
    pub spent: f64,
    pub limit: f64,
    /// Unclamped; values above 100 mean over budget
    pub percent: f64,
    pub status: BudgetStatus,
}

impl BudgetUtilization {
    /// Percentage clamped to 100 for progress bars
    pub fn display_percent(&self) -> f64 {
        self.percent.min(100.0)
    }

    pub fn remaining(&self) -> f64 {
        self.limit - self.spent
    }
}

/// Spent-to-limit ratio for a budget as a percentage
///
/// A non-positive limit yields 0 rather than dividing by zero.
pub fn utilization_percent(spent: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        spent / limit * 100.0
    } else {
        0.0
    }
}

/// Measure a budget against per-category totals
pub fn budget_utilization(
    budget: &Budget,
    category_totals: &BTreeMap<Category, f64>,
) -> BudgetUtilization {
    let spent = category_totals
        .get(&budget.category)
        .copied()
        .unwrap_or(0.0);
    let percent = utilization_percent(spent, budget.limit);

    BudgetUtilization {
        budget_id: budget.id.clone(),
        category: budget.category.clone(),
        spent,
        limit: budget.limit,
        percent,
        status: BudgetStatus::from_percent(percent),
    }
}

/// Completion percentage of a savings goal, unclamped
///
/// Defined as 0 when the target is 0.
pub fn goal_progress(goal: &SavingsGoal) -> f64 {
    if goal.target_amount == 0.0 {
        0.0
    } else {
        goal.current_amount / goal.target_amount * 100.0
    }
}

/// Goal progress as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub goal_name: String,
    pub current_amount: f64,
    pub target_amount: f64,
    pub percent: f64,
}

impl GoalProgress {
    pub fn from_goal(goal: &SavingsGoal) -> Self {
        Self {
            goal_id: goal.id.clone(),
            goal_name: goal.goal_name.clone(),
            current_amount: goal.current_amount,
            target_amount: goal.target_amount,
            percent: goal_progress(goal),
        }
    }

    /// Whole-number percentage for labels
    pub fn rounded_percent(&self) -> i64 {
        self.percent.round() as i64
    }
}

/// Transactions strictly newer than `now - days`, in ledger order
pub fn recent_transactions(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    days: i64,
) -> Vec<Transaction> {
    let cutoff = now - Duration::days(days);
    transactions
        .iter()
        .filter(|t| t.date > cutoff)
        .cloned()
        .collect()
}

/// Everything the dashboard renders for the month containing `now`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub year: i32,
    pub month: u32,
    pub totals: MonthlyTotals,
    pub expenses_by_category: BTreeMap<Category, f64>,
    pub budgets: Vec<BudgetUtilization>,
    pub goals: Vec<GoalProgress>,
}

/// Compute the dashboard aggregates for the month containing `now` in `tz`
pub fn dashboard_snapshot<Tz: TimeZone>(
    ledger: &Ledger,
    now: DateTime<Utc>,
    tz: &Tz,
) -> DashboardSnapshot {
    let local_now = now.with_timezone(tz);
    let (year, month) = (local_now.year(), local_now.month());
    let transactions = ledger.transactions();

    let expenses_by_category = monthly_expenses_by_category_in(transactions, year, month, tz);
    let budgets = ledger
        .budgets()
        .iter()
        .map(|b| budget_utilization(b, &expenses_by_category))
        .collect();
    let goals = ledger
        .savings_goals()
        .iter()
        .map(GoalProgress::from_goal)
        .collect();

    DashboardSnapshot {
        year,
        month,
        totals: monthly_totals_in(transactions, year, month, tz),
        expenses_by_category,
        budgets,
        goals,
    }
}

fn in_month<Tz: TimeZone>(date: &DateTime<Utc>, year: i32, month: u32, tz: &Tz) -> bool {
    let local = date.with_timezone(tz);
    local.year() == year && local.month() == month
}
