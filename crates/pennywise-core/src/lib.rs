//! Pennywise Core Library
//!
//! Shared functionality for the Pennywise personal finance dashboard:
//! - In-memory ledger of transactions, budgets and savings goals
//! - Monthly totals, category breakdowns, budget and goal progress
//! - Pluggable hosted AI backends (Gemini, OpenAI-compatible) for
//!   free-text transaction entry and weekly summaries
//! - Prompt library for customizable AI prompts
//! - CSV export
//! - Per-session request state for AI-triggered actions

pub mod aggregate;
pub mod ai;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod prompts;
pub mod session;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{
    BudgetStatus, BudgetUtilization, DashboardSnapshot, GoalProgress, MonthlyTotals,
};
pub use ai::{
    AIBackend, AIClient, GeminiBackend, MockBackend, OpenAICompatibleBackend, ParsedTransaction,
};
pub use config::{BackendKind, Config};
pub use error::{Error, Result, INGESTION_FAILED_MESSAGE, SUMMARY_FAILED_MESSAGE};
pub use export::{CsvOptions, CSV_CONTENT_TYPE, EXPORT_FILE_NAME};
pub use ledger::Ledger;
pub use models::{
    Budget, Category, NewBudget, NewSavingsGoal, SavingsGoal, Transaction, TransactionType,
};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use session::{RequestKind, RequestState, RequestTracker, Session, WeeklySummary};
