//! Single-writer application state container.
//!
//! All mutations go through [`AppStore::dispatch`]. The reducer runs on a copy
//! of the current state while holding the channel's write lock, and the copy is
//! published only when the reducer succeeds. Readers therefore always observe a
//! fully committed [`AppState`].

use std::{fmt, sync::Arc};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    core::services::{SuggestionService, SummaryService},
    errors::{BudgetError, Result},
    ledger::{
        BudgetAllocation, BudgetHistory, BudgetHistoryEntry, Dataset, Decision, DecisionEvent,
        Period, PeriodSummary, RLSuggestion, Transaction, TransactionId, TransactionLedger,
        UserProfile, DEFAULT_ALLOCATION_TOLERANCE, DEFAULT_HISTORY_CAPACITY,
    },
};

/// Where the data currently on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataOrigin {
    /// Returned by the configured budget service.
    Live,
    /// Last-known dataset read back from disk.
    Cached,
    /// Built-in deterministic dataset.
    #[default]
    Fixture,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataOrigin::Live => "live",
            DataOrigin::Cached => "cached",
            DataOrigin::Fixture => "fixture",
        };
        f.write_str(label)
    }
}

/// Suggestion panel status, independent of the suggestion's own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestionUiStatus {
    #[default]
    Idle,
    Loading,
    Accepted,
    Rejected,
}

impl From<Decision> for SuggestionUiStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => SuggestionUiStatus::Accepted,
            Decision::Rejected => SuggestionUiStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub profile: Option<UserProfile>,
    pub ledger: TransactionLedger,
    pub income: f64,
    /// Working allocation the summary is computed against.
    pub allocation: BudgetAllocation,
    pub period: Period,
    pub summary: PeriodSummary,
    /// At most one suggestion awaiting a decision.
    pub suggestion: Option<RLSuggestion>,
    pub suggestion_status: SuggestionUiStatus,
    pub history: BudgetHistory,
    pub origin: DataOrigin,
    pub sidebar_open: bool,
    pub allocation_tolerance: f64,
}

impl AppState {
    pub fn new(period: Period) -> Self {
        Self {
            profile: None,
            ledger: TransactionLedger::new(),
            income: 0.0,
            allocation: BudgetAllocation::default(),
            period,
            summary: PeriodSummary::empty(period),
            suggestion: None,
            suggestion_status: SuggestionUiStatus::Idle,
            history: BudgetHistory::with_capacity(DEFAULT_HISTORY_CAPACITY),
            origin: DataOrigin::default(),
            sidebar_open: true,
            allocation_tolerance: DEFAULT_ALLOCATION_TOLERANCE,
        }
    }

    /// Starts in the calendar month containing today.
    pub fn current_month() -> Self {
        Self::new(Period::month_containing(Utc::now().date_naive()))
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = BudgetHistory::with_capacity(capacity);
        self
    }

    pub fn with_allocation_tolerance(mut self, tolerance: f64) -> Self {
        self.allocation_tolerance = tolerance;
        self
    }

    /// Snapshot of the persistable parts. `None` until a profile is known.
    pub fn to_dataset(&self) -> Option<Dataset> {
        let profile = self.profile.clone()?;
        Some(Dataset {
            profile,
            transactions: self.ledger.clone().into_entries(),
            allocation: self.allocation,
            suggestion: None,
            history: self.history.entries().to_vec(),
            period: Some(self.period),
        })
    }

    /// Working income and the profile's copy move together.
    fn set_income(&mut self, income: f64) {
        self.income = income;
        if let Some(profile) = self.profile.as_mut() {
            profile.monthly_income = income;
        }
    }

    fn recompute_summary(&mut self) {
        self.summary = SummaryService::compute_with_tolerance(
            &self.ledger,
            self.income,
            &self.allocation,
            self.period,
            self.allocation_tolerance,
        );
    }
}

/// Every mutation the store accepts.
#[derive(Debug, Clone)]
pub enum StoreAction {
    LoadDataset { dataset: Dataset, origin: DataOrigin },
    SetProfile(UserProfile),
    SetTransactions(Vec<Transaction>),
    AddTransaction(Transaction),
    RemoveTransaction(TransactionId),
    /// Bulk insert; entries are expected newest first.
    ImportTransactions(Vec<Transaction>),
    SetIncome(f64),
    SetAllocation(BudgetAllocation),
    SetPeriod(Period),
    /// Period and income reported by the service's own summary.
    AdoptSummary { period: Period, income: f64 },
    SetOrigin(DataOrigin),
    BeginSuggestionRequest,
    SetSuggestion(Option<RLSuggestion>),
    DecideSuggestion(Decision),
    SetHistory(Vec<BudgetHistoryEntry>),
    AppendHistory(BudgetHistoryEntry),
    ToggleSidebar,
}

impl StoreAction {
    fn name(&self) -> &'static str {
        match self {
            StoreAction::LoadDataset { .. } => "load_dataset",
            StoreAction::SetProfile(_) => "set_profile",
            StoreAction::SetTransactions(_) => "set_transactions",
            StoreAction::AddTransaction(_) => "add_transaction",
            StoreAction::RemoveTransaction(_) => "remove_transaction",
            StoreAction::ImportTransactions(_) => "import_transactions",
            StoreAction::SetIncome(_) => "set_income",
            StoreAction::SetAllocation(_) => "set_allocation",
            StoreAction::SetPeriod(_) => "set_period",
            StoreAction::AdoptSummary { .. } => "adopt_summary",
            StoreAction::SetOrigin(_) => "set_origin",
            StoreAction::BeginSuggestionRequest => "begin_suggestion_request",
            StoreAction::SetSuggestion(_) => "set_suggestion",
            StoreAction::DecideSuggestion(_) => "decide_suggestion",
            StoreAction::SetHistory(_) => "set_history",
            StoreAction::AppendHistory(_) => "append_history",
            StoreAction::ToggleSidebar => "toggle_sidebar",
        }
    }

    /// Whether the derived summary must be rebuilt after this action.
    fn touches_summary_inputs(&self) -> bool {
        matches!(
            self,
            StoreAction::LoadDataset { .. }
                | StoreAction::SetProfile(_)
                | StoreAction::SetTransactions(_)
                | StoreAction::AddTransaction(_)
                | StoreAction::RemoveTransaction(_)
                | StoreAction::ImportTransactions(_)
                | StoreAction::SetIncome(_)
                | StoreAction::SetAllocation(_)
                | StoreAction::SetPeriod(_)
                | StoreAction::AdoptSummary { .. }
                | StoreAction::DecideSuggestion(Decision::Accepted)
        )
    }
}

/// What a committed action produced besides the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreEffect {
    #[default]
    None,
    Decided(DecisionEvent),
    /// Records actually added and ids skipped because the ledger already held them.
    Imported { added: usize, skipped: usize },
}

impl StoreEffect {
    pub fn decision(self) -> Option<DecisionEvent> {
        match self {
            StoreEffect::Decided(event) => Some(event),
            _ => None,
        }
    }
}

/// Cloneable handle to the shared state. All clones see the same state.
#[derive(Debug, Clone)]
pub struct AppStore {
    sender: Arc<watch::Sender<Arc<AppState>>>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(AppState::current_month())
    }
}

impl AppStore {
    pub fn new(mut initial: AppState) -> Self {
        initial.recompute_summary();
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Latest committed state.
    pub fn snapshot(&self) -> Arc<AppState> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.sender.subscribe()
    }

    /// Applies `action` atomically. On error the published state is unchanged.
    ///
    /// Returns the decision event or import counts the action produced.
    pub fn dispatch(&self, action: StoreAction) -> Result<StoreEffect> {
        let name = action.name();
        let mut outcome: Result<StoreEffect> = Ok(StoreEffect::None);
        self.sender.send_if_modified(|current| {
            let mut next = (**current).clone();
            match reduce(&mut next, action) {
                Ok(effect) => {
                    *current = Arc::new(next);
                    outcome = Ok(effect);
                    true
                }
                Err(err) => {
                    outcome = Err(err);
                    false
                }
            }
        });
        match &outcome {
            Ok(_) => debug!(action = name, "store action committed"),
            Err(err) => debug!(action = name, error = %err, "store action rejected"),
        }
        outcome
    }
}

fn reduce(state: &mut AppState, action: StoreAction) -> Result<StoreEffect> {
    let recompute = action.touches_summary_inputs();
    let mut effect = StoreEffect::None;

    match action {
        StoreAction::LoadDataset { dataset, origin } => {
            info!(
                %origin,
                transactions = dataset.transactions.len(),
                history = dataset.history.len(),
                "loading dataset"
            );
            state.income = dataset.profile.monthly_income;
            state.profile = Some(dataset.profile);
            state.ledger = TransactionLedger::from_entries(dataset.transactions);
            state.allocation = dataset.allocation;
            state.suggestion = dataset
                .suggestion
                .filter(|suggestion| !suggestion.status.is_final());
            state.suggestion_status = SuggestionUiStatus::Idle;
            state.history.replace(dataset.history);
            if let Some(period) = dataset.period {
                state.period = period;
            }
            state.origin = origin;
        }
        StoreAction::SetProfile(profile) => {
            ensure_income(profile.monthly_income)?;
            state.income = profile.monthly_income;
            state.profile = Some(profile);
        }
        StoreAction::SetTransactions(transactions) => {
            state.ledger = TransactionLedger::from_entries(transactions);
        }
        StoreAction::AddTransaction(transaction) => {
            state.ledger.add(transaction);
        }
        StoreAction::RemoveTransaction(id) => {
            if state.ledger.remove(&id).is_none() {
                debug!(%id, "remove ignored; transaction not in ledger");
            }
        }
        StoreAction::ImportTransactions(transactions) => {
            let (mut added, mut skipped) = (0, 0);
            for transaction in transactions.into_iter().rev() {
                if state.ledger.contains(&transaction.id) {
                    warn!(id = %transaction.id, "skipping imported transaction already in ledger");
                    skipped += 1;
                    continue;
                }
                state.ledger.add(transaction);
                added += 1;
            }
            effect = StoreEffect::Imported { added, skipped };
        }
        StoreAction::SetIncome(income) => {
            ensure_income(income)?;
            state.set_income(income);
        }
        StoreAction::SetAllocation(allocation) => {
            if !allocation.is_finite() {
                return Err(BudgetError::InvalidInput(
                    "allocation contains non-finite values".into(),
                ));
            }
            state.allocation = allocation;
        }
        StoreAction::SetPeriod(period) => {
            state.period = period;
        }
        StoreAction::AdoptSummary { period, income } => {
            ensure_income(income)?;
            state.period = period;
            state.set_income(income);
        }
        StoreAction::SetOrigin(origin) => {
            state.origin = origin;
        }
        StoreAction::BeginSuggestionRequest => {
            state.suggestion_status = SuggestionUiStatus::Loading;
        }
        StoreAction::SetSuggestion(suggestion) => {
            state.suggestion = suggestion.filter(|suggestion| !suggestion.status.is_final());
            state.suggestion_status = SuggestionUiStatus::Idle;
        }
        StoreAction::DecideSuggestion(decision) => {
            let mut suggestion = state
                .suggestion
                .take()
                .ok_or(BudgetError::NoActiveSuggestion)?;
            SuggestionService::record_decision(&mut suggestion, decision)?;
            if decision == Decision::Accepted {
                state.allocation = suggestion.suggested_allocation;
            }
            state.suggestion_status = decision.into();
            info!(id = %suggestion.id, %decision, "suggestion decided");
            effect = StoreEffect::Decided(DecisionEvent {
                suggestion_id: suggestion.id,
                decision,
            });
        }
        StoreAction::SetHistory(entries) => {
            state.history.replace(entries);
        }
        StoreAction::AppendHistory(entry) => {
            state.history.append(entry)?;
        }
        StoreAction::ToggleSidebar => {
            state.sidebar_open = !state.sidebar_open;
        }
    }

    if recompute {
        state.recompute_summary();
    }
    Ok(effect)
}

fn ensure_income(income: f64) -> Result<()> {
    if !income.is_finite() || income < 0.0 {
        return Err(BudgetError::InvalidInput(format!(
            "income must be zero or more, got {}",
            income
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::ledger::{Category, ModelType, SuggestionMeta, TransactionSource};

    fn feb() -> Period {
        Period::month_containing(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
    }

    fn txn(amount: f64, category: Category, day: u32) -> Transaction {
        Transaction::new(
            amount,
            category,
            "entry",
            NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            TransactionSource::Manual,
        )
    }

    fn store() -> AppStore {
        let store = AppStore::new(AppState::new(feb()));
        store.dispatch(StoreAction::SetIncome(75_000.0)).unwrap();
        store
    }

    fn suggestion() -> RLSuggestion {
        let current = BudgetAllocation {
            food: 15.0,
            savings: 85.0,
            ..BudgetAllocation::default()
        };
        let suggested = BudgetAllocation {
            food: 13.0,
            savings: 87.0,
            ..BudgetAllocation::default()
        };
        SuggestionService::build(
            current,
            suggested,
            SuggestionMeta {
                expected_savings_increase: 0.02,
                confidence: 0.8,
                reasoning: "trim food".into(),
                model_type: ModelType::Dqn,
            },
        )
    }

    #[test]
    fn ledger_writes_recompute_summary() {
        let store = store();
        let entry = txn(850.0, Category::Food, 11);
        let id = entry.id.clone();
        store.dispatch(StoreAction::AddTransaction(entry)).unwrap();
        assert_eq!(store.snapshot().summary.total_spent, 850.0);

        store.dispatch(StoreAction::RemoveTransaction(id)).unwrap();
        assert_eq!(store.snapshot().summary.total_spent, 0.0);
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let store = store();
        store
            .dispatch(StoreAction::AddTransaction(txn(100.0, Category::Food, 3)))
            .unwrap();
        let before = store.snapshot();
        store
            .dispatch(StoreAction::RemoveTransaction(TransactionId::from("missing")))
            .unwrap();
        assert_eq!(store.snapshot().ledger, before.ledger);
    }

    #[test]
    fn rejected_action_leaves_state_untouched() {
        let store = store();
        let before = store.snapshot();
        let err = store
            .dispatch(StoreAction::SetIncome(f64::NAN))
            .expect_err("NaN income");
        assert!(matches!(err, BudgetError::InvalidInput(_)));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn accepting_commits_allocation_and_clears_slot() {
        let store = store();
        let pending = suggestion();
        let id = pending.id;
        store
            .dispatch(StoreAction::SetSuggestion(Some(pending)))
            .unwrap();

        let event = store
            .dispatch(StoreAction::DecideSuggestion(Decision::Accepted))
            .unwrap()
            .decision()
            .expect("decision event");
        assert_eq!(event.suggestion_id, id);

        let state = store.snapshot();
        assert!(state.suggestion.is_none());
        assert_eq!(state.allocation.food, 13.0);
        assert_eq!(state.suggestion_status, SuggestionUiStatus::Accepted);
        assert_eq!(state.summary.category(Category::Food).budget, 9_750.0);
    }

    #[test]
    fn import_reports_only_new_records() {
        let store = store();
        let existing = txn(100.0, Category::Food, 3);
        store
            .dispatch(StoreAction::AddTransaction(existing.clone()))
            .unwrap();

        let effect = store
            .dispatch(StoreAction::ImportTransactions(vec![
                txn(40.0, Category::Transport, 5),
                existing,
            ]))
            .unwrap();
        assert_eq!(effect, StoreEffect::Imported { added: 1, skipped: 1 });
        assert_eq!(store.snapshot().ledger.len(), 2);
        assert_eq!(effect.decision(), None);
    }

    #[test]
    fn deciding_without_suggestion_fails() {
        let store = store();
        let err = store
            .dispatch(StoreAction::DecideSuggestion(Decision::Rejected))
            .expect_err("nothing to decide");
        assert!(matches!(err, BudgetError::NoActiveSuggestion));
    }

    #[test]
    fn second_decision_is_rejected() {
        let store = store();
        store
            .dispatch(StoreAction::SetSuggestion(Some(suggestion())))
            .unwrap();
        store
            .dispatch(StoreAction::DecideSuggestion(Decision::Rejected))
            .unwrap();
        let allocation = store.snapshot().allocation;
        assert!(store
            .dispatch(StoreAction::DecideSuggestion(Decision::Accepted))
            .is_err());
        assert_eq!(store.snapshot().allocation, allocation);
        assert_eq!(
            store.snapshot().suggestion_status,
            SuggestionUiStatus::Rejected
        );
    }

    #[test]
    fn subscribers_see_committed_state() {
        let store = store();
        let mut receiver = store.subscribe();
        store.dispatch(StoreAction::ToggleSidebar).unwrap();
        assert!(receiver.has_changed().unwrap());
        assert!(!receiver.borrow_and_update().sidebar_open);
    }
}
