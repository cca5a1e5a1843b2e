//! One dashboard session: the ledger, the AI client and per-kind request state
//!
//! Each AI-triggered action (ingestion, summary) has its own request state,
//! so a running summary never blocks a transaction from being parsed.
//! Starting an action of a kind that is already in flight fails with
//! `Error::Busy`.
//!
//! Locks are never held across an `.await`: the ledger is read or written
//! before and after the AI call, not during it.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use crate::aggregate::{dashboard_snapshot, recent_transactions, DashboardSnapshot};
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result, INGESTION_FAILED_MESSAGE, SUMMARY_FAILED_MESSAGE};
use crate::export::{transactions_csv, CsvOptions};
use crate::ledger::Ledger;
use crate::models::{Budget, NewBudget, NewSavingsGoal, SavingsGoal, Transaction};

/// Width of the summary window in days
pub const SUMMARY_WINDOW_DAYS: i64 = 7;

/// Shown instead of a summary when the window holds no transactions
pub const EMPTY_WINDOW_MESSAGE: &str = "No transactions in the last 7 days to analyze.";

/// AI-triggered operations that are tracked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Ingestion,
    Summary,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Summary => "summary",
        }
    }

    /// User-facing message for any failure of this kind
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Ingestion => INGESTION_FAILED_MESSAGE,
            Self::Summary => SUMMARY_FAILED_MESSAGE,
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of the most recent request of one kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    /// Carries the message to show the user
    Failed(String),
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Request state per `RequestKind`
#[derive(Debug, Default)]
pub struct RequestTracker {
    ingestion: Mutex<RequestState>,
    summary: Mutex<RequestState>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: RequestKind) -> MutexGuard<'_, RequestState> {
        let slot = match kind {
            RequestKind::Ingestion => &self.ingestion,
            RequestKind::Summary => &self.summary,
        };
        // A poisoned slot still holds a valid state value
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state for `kind`
    pub fn state(&self, kind: RequestKind) -> RequestState {
        self.slot(kind).clone()
    }

    /// Whether any AI request is outstanding
    pub fn any_in_flight(&self) -> bool {
        [RequestKind::Ingestion, RequestKind::Summary]
            .into_iter()
            .any(|kind| self.slot(kind).is_in_flight())
    }

    /// Mark `kind` in flight, or fail if it already is
    pub fn begin(&self, kind: RequestKind) -> Result<RequestGuard<'_>> {
        let mut slot = self.slot(kind);
        if slot.is_in_flight() {
            return Err(Error::Busy(kind.as_str()));
        }
        *slot = RequestState::InFlight;
        debug!(kind = %kind, "Request started");

        Ok(RequestGuard {
            tracker: self,
            kind,
            finished: false,
        })
    }

    fn finish(&self, kind: RequestKind, state: RequestState) {
        debug!(kind = %kind, state = ?state, "Request finished");
        *self.slot(kind) = state;
    }
}

/// Holds a request kind in flight until resolved
///
/// Dropping an unresolved guard (for example when the owning future is
/// cancelled) returns the kind to `Idle` so it can be retried.
pub struct RequestGuard<'a> {
    tracker: &'a RequestTracker,
    kind: RequestKind,
    finished: bool,
}

impl RequestGuard<'_> {
    pub fn succeed(mut self) {
        self.finished = true;
        self.tracker.finish(self.kind, RequestState::Succeeded);
    }

    pub fn fail(mut self) {
        self.finished = true;
        self.tracker.finish(
            self.kind,
            RequestState::Failed(self.kind.failure_message().to_string()),
        );
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.finish(self.kind, RequestState::Idle);
        }
    }
}

/// Outcome of a weekly summary request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeeklySummary {
    /// Markdown text from the AI backend
    Generated(String),
    /// The window was empty; the backend was not called
    NoRecentTransactions,
}

impl WeeklySummary {
    /// Text to display
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::NoRecentTransactions => EMPTY_WINDOW_MESSAGE,
        }
    }
}

/// State for one dashboard session
///
/// Constructed once and passed by reference; nothing here is global.
pub struct Session {
    ledger: RwLock<Ledger>,
    ai: AIClient,
    requests: RequestTracker,
}

impl Session {
    pub fn new(ledger: Ledger, ai: AIClient) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            ai,
            requests: RequestTracker::new(),
        }
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    fn read_ledger(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.ledger
            .read()
            .map_err(|_| Error::InvalidData("Failed to acquire ledger lock".into()))
    }

    fn write_ledger(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.ledger
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire ledger lock".into()))
    }

    /// Copy of the current ledger
    pub fn ledger(&self) -> Result<Ledger> {
        Ok(self.read_ledger()?.clone())
    }

    /// Transactions, most recent first
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.read_ledger()?.transactions().to_vec())
    }

    pub fn request_state(&self, kind: RequestKind) -> RequestState {
        self.requests.state(kind)
    }

    /// Whether any AI request is outstanding
    pub fn ai_busy(&self) -> bool {
        self.requests.any_in_flight()
    }

    /// Parse free text with the AI backend and record the result as an expense
    ///
    /// On any failure the ledger is left untouched and the ingestion state
    /// becomes `Failed` with `INGESTION_FAILED_MESSAGE`. Blank input is
    /// rejected before the backend is called.
    pub async fn add_transaction_from_text(&self, text: &str) -> Result<Transaction> {
        if text.trim().is_empty() {
            return Err(Error::Validation("Transaction text is empty".into()));
        }

        let request = self.requests.begin(RequestKind::Ingestion)?;

        let parsed = match self.ai.parse_transaction(text).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, model = self.ai.model(), "AI ingestion failed");
                request.fail();
                return Err(e);
            }
        };

        let recorded = self
            .write_ledger()
            .and_then(|mut ledger| ledger.record_parsed(parsed, Utc::now()));

        match recorded {
            Ok(transaction) => {
                info!(id = %transaction.id, category = %transaction.category, "Recorded AI transaction");
                request.succeed();
                Ok(transaction)
            }
            Err(e) => {
                warn!(error = %e, "Rejected AI transaction");
                request.fail();
                Err(e)
            }
        }
    }

    /// Summarize transactions from the last seven days before `now`
    ///
    /// An empty window returns `WeeklySummary::NoRecentTransactions` without
    /// touching the request state or calling the backend.
    pub async fn generate_weekly_summary(&self, now: DateTime<Utc>) -> Result<WeeklySummary> {
        let recent = recent_transactions(self.read_ledger()?.transactions(), now, SUMMARY_WINDOW_DAYS);
        if recent.is_empty() {
            debug!("Summary window is empty");
            return Ok(WeeklySummary::NoRecentTransactions);
        }

        let request = self.requests.begin(RequestKind::Summary)?;
        match self.ai.weekly_summary(&recent).await {
            Ok(text) => {
                info!(transactions = recent.len(), "Generated weekly summary");
                request.succeed();
                Ok(WeeklySummary::Generated(text))
            }
            Err(e) => {
                warn!(error = %e, model = self.ai.model(), "Weekly summary failed");
                request.fail();
                Err(e)
            }
        }
    }

    /// Summary text ready for display, with failures mapped to the user message
    pub async fn weekly_summary_text(&self, now: DateTime<Utc>) -> String {
        match self.generate_weekly_summary(now).await {
            Ok(summary) => summary.text().to_string(),
            Err(_) => RequestKind::Summary.failure_message().to_string(),
        }
    }

    pub fn add_budget(&self, input: NewBudget) -> Result<Budget> {
        input.validate()?;
        Ok(self.write_ledger()?.add_budget(input))
    }

    pub fn add_savings_goal(&self, input: NewSavingsGoal) -> Result<SavingsGoal> {
        input.validate()?;
        Ok(self.write_ledger()?.add_savings_goal(input))
    }

    /// All transactions as CSV, dates in local time
    pub fn export_csv(&self) -> Result<String> {
        Ok(transactions_csv(
            self.read_ledger()?.transactions(),
            &CsvOptions::default(),
        ))
    }

    /// Aggregates for the local month containing `now`
    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardSnapshot> {
        Ok(dashboard_snapshot(&*self.read_ledger()?, now, &Local))
    }
}
