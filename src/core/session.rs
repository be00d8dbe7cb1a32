//! Dashboard orchestration: service calls, fallback, and store updates.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    client::{fixture_dataset, BudgetApi},
    config::Config,
    errors::{BudgetError, Result},
    ledger::{
        Dataset, Decision, DecisionEvent, ModelType, PeriodSummary, ProfileUpdate, RLSuggestion,
        Transaction, TransactionId, TransactionQuery, TransactionSource,
    },
    utils::persistence::DatasetCache,
};

use super::{
    sequencer::RequestSequencer,
    services::{ImportService, TransactionDraft, TransactionService},
    store::{AppState, AppStore, DataOrigin, StoreAction, StoreEffect},
};

#[derive(Debug, Default)]
struct Sequencers {
    summary: RequestSequencer,
    suggestion: RequestSequencer,
    /// Unfiltered listings, which replace the ledger.
    ledger: RequestSequencer,
    /// Filtered listings, which never touch the store.
    listing: RequestSequencer,
    history: RequestSequencer,
}

/// Drives one user's dashboard against a [`BudgetApi`].
///
/// Service failures that [`BudgetError::is_recoverable`] accepts never reach
/// the caller: the session substitutes the cached dataset, or the fixture when
/// nothing is cached, and keeps going. Clones share the same store.
#[derive(Clone)]
pub struct DashboardSession {
    store: AppStore,
    api: Arc<dyn BudgetApi>,
    fallback: Arc<Dataset>,
    cache: Option<DatasetCache>,
    sequencers: Arc<Sequencers>,
    feedback: Arc<Mutex<Vec<JoinHandle<()>>>>,
    history_months: u32,
    default_model: ModelType,
}

impl DashboardSession {
    pub fn new(api: Arc<dyn BudgetApi>) -> Self {
        Self {
            store: AppStore::default(),
            api,
            fallback: Arc::new(fixture_dataset()),
            cache: None,
            sequencers: Arc::new(Sequencers::default()),
            feedback: Arc::default(),
            history_months: Config::default_history_months(),
            default_model: ModelType::default(),
        }
    }

    /// Session wired from configuration. `cache_path` enables the disk cache.
    pub fn from_config(api: Arc<dyn BudgetApi>, config: &Config) -> Self {
        let state = AppState::current_month()
            .with_history_capacity(config.history_capacity)
            .with_allocation_tolerance(config.allocation_tolerance);
        let mut session = Self::new(api).with_store(AppStore::new(state));
        session.history_months = config.history_months;
        session.default_model = config.default_model_type;
        if let Some(path) = &config.cache_path {
            session = session.with_cache(DatasetCache::new(path));
        }
        session
    }

    pub fn with_store(mut self, store: AppStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_cache(mut self, cache: DatasetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the last-resort dataset used when nothing is cached.
    pub fn with_fallback(mut self, dataset: Dataset) -> Self {
        self.fallback = Arc::new(dataset);
        self
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    /// Loads profile, transactions, history, and a first suggestion.
    pub async fn bootstrap(&self) -> Result<()> {
        info!("bootstrapping dashboard session");
        let (fallback, fallback_origin) = self.fallback_dataset();
        let mut degraded = false;

        let profile = match self.api.profile().await {
            Ok(profile) => profile,
            Err(err) => {
                recover("profile", err)?;
                degraded = true;
                fallback.profile.clone()
            }
        };
        let transactions = match self.fetch_ledger().await {
            Ok(Some(transactions)) => transactions,
            Ok(None) => {
                degraded = true;
                fallback.transactions.clone()
            }
            Err(err) => {
                recover("transactions", err)?;
                degraded = true;
                fallback.transactions.clone()
            }
        };
        let history = match self.api.history(self.history_months).await {
            Ok(history) => history,
            Err(err) => {
                recover("history", err)?;
                degraded = true;
                fallback.history.clone()
            }
        };

        let origin = if degraded {
            fallback_origin
        } else {
            DataOrigin::Live
        };
        let allocation = history
            .last()
            .map(|entry| entry.allocation)
            .unwrap_or(fallback.allocation);
        let dataset = Dataset {
            profile,
            transactions,
            allocation,
            suggestion: None,
            history,
            period: if degraded { fallback.period } else { None },
        };
        self.store
            .dispatch(StoreAction::LoadDataset { dataset, origin })?;
        if origin == DataOrigin::Live {
            self.persist();
        }

        self.refresh_summary().await?;
        self.request_suggestion(self.default_model).await?;
        info!(%origin, "dashboard session ready");
        Ok(())
    }

    /// Adopts the service's period and income. Spend figures are always
    /// derived locally from the ledger.
    pub async fn refresh_summary(&self) -> Result<PeriodSummary> {
        let ticket = self.sequencers.summary.begin();
        let period = self.store.snapshot().period;
        match self.api.summary(period).await {
            Ok(remote) => {
                if !self.sequencers.summary.is_latest(ticket) {
                    debug!("discarding stale summary response");
                } else {
                    self.store.dispatch(StoreAction::AdoptSummary {
                        period: remote.period,
                        income: remote.income,
                    })?;
                }
            }
            Err(err) => recover("summary", err)?,
        }
        Ok(self.store.snapshot().summary.clone())
    }

    /// Fetches a transaction listing. A complete unfiltered listing replaces
    /// the ledger; filtered listings are returned without touching the store.
    ///
    /// Returns `None` when a newer request of the same kind superseded this one.
    pub async fn refresh_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Option<Vec<Transaction>>> {
        if query == TransactionQuery::default() {
            return self.refresh_ledger().await;
        }
        let ticket = self.sequencers.listing.begin();
        let transactions = match self.api.transactions(&query).await {
            Ok(page) => page.transactions,
            Err(err) => {
                recover("transactions", err)?;
                self.local_listing(&query)
            }
        };
        if !self.sequencers.listing.is_latest(ticket) {
            debug!(?query, "discarding stale transactions response");
            return Ok(None);
        }
        Ok(Some(transactions))
    }

    async fn refresh_ledger(&self) -> Result<Option<Vec<Transaction>>> {
        let ticket = self.sequencers.ledger.begin();
        let fetched = match self.fetch_ledger().await {
            Ok(fetched) => fetched,
            Err(err) => {
                recover("transactions", err)?;
                return Ok(Some(self.local_listing(&TransactionQuery::default())));
            }
        };
        if !self.sequencers.ledger.is_latest(ticket) {
            debug!("discarding stale ledger response");
            return Ok(None);
        }
        match fetched {
            Some(transactions) => {
                self.store
                    .dispatch(StoreAction::SetTransactions(transactions.clone()))?;
                self.persist();
                Ok(Some(transactions))
            }
            None => Ok(Some(self.local_listing(&TransactionQuery::default()))),
        }
    }

    /// Every transaction the service holds, or `None` when it will only hand
    /// out part of them. Pages that report a larger `total` are re-requested
    /// once with that total as the limit.
    async fn fetch_ledger(&self) -> Result<Option<Vec<Transaction>>> {
        let mut page = self.api.transactions(&TransactionQuery::default()).await?;
        if page.total > page.transactions.len() {
            debug!(
                received = page.transactions.len(),
                total = page.total,
                "transaction page is partial; widening limit"
            );
            let widened = TransactionQuery::default().with_limit(page.total);
            page = self.api.transactions(&widened).await?;
        }
        if page.total > page.transactions.len() {
            warn!(
                received = page.transactions.len(),
                total = page.total,
                "service returned an incomplete ledger; keeping local transactions"
            );
            return Ok(None);
        }
        Ok(Some(page.transactions))
    }

    fn local_listing(&self, query: &TransactionQuery) -> Vec<Transaction> {
        let state = self.store.snapshot();
        state.ledger.query(query).into_iter().cloned().collect()
    }

    /// Returns `true` when fresh history was committed.
    pub async fn refresh_history(&self, months: u32) -> Result<bool> {
        let ticket = self.sequencers.history.begin();
        let entries = match self.api.history(months).await {
            Ok(entries) => entries,
            Err(err) => {
                recover("history", err)?;
                return Ok(false);
            }
        };
        if !self.sequencers.history.is_latest(ticket) {
            debug!(months, "discarding stale history response");
            return Ok(false);
        }
        self.store.dispatch(StoreAction::SetHistory(entries))?;
        Ok(true)
    }

    /// Requests a suggestion for the next period. Only the newest request may
    /// fill the suggestion slot; older responses yield `Ok(None)`.
    pub async fn request_suggestion(&self, model_type: ModelType) -> Result<Option<RLSuggestion>> {
        let ticket = self.sequencers.suggestion.begin();
        self.store.dispatch(StoreAction::BeginSuggestionRequest)?;
        let period = self.store.snapshot().period;

        let outcome = match self.api.suggestion(model_type, period).await {
            Ok(envelope) => envelope.into_suggestion(),
            Err(err) => Err(err),
        };
        let suggestion = match outcome {
            Ok(suggestion) => Some(suggestion),
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, %model_type, "suggestion unavailable; using fallback");
                self.fallback.suggestion.clone()
            }
            Err(err) => {
                if self.sequencers.suggestion.is_latest(ticket) {
                    self.store.dispatch(StoreAction::SetSuggestion(None))?;
                }
                return Err(err);
            }
        };

        if !self.sequencers.suggestion.is_latest(ticket) {
            debug!(%model_type, "discarding stale suggestion response");
            return Ok(None);
        }
        self.store
            .dispatch(StoreAction::SetSuggestion(suggestion.clone()))?;
        Ok(suggestion)
    }

    /// Records the decision locally, then reports it in the background.
    /// Feedback failures are logged and never undo the decision.
    ///
    /// Call [`DashboardSession::flush_feedback`] before shutting the runtime
    /// down, or pending reports are cancelled with it.
    pub async fn decide(&self, decision: Decision) -> Result<DecisionEvent> {
        let event = self
            .store
            .dispatch(StoreAction::DecideSuggestion(decision))?
            .decision()
            .ok_or(BudgetError::NoActiveSuggestion)?;
        if decision == Decision::Accepted {
            self.persist();
        }

        let api = Arc::clone(&self.api);
        let task = tokio::spawn(async move {
            let budget_id = event.suggestion_id.to_string();
            match api.feedback(&budget_id, event.decision).await {
                Ok(()) => debug!(%budget_id, decision = %event.decision, "feedback delivered"),
                Err(err) => warn!(%budget_id, error = %err, "feedback not delivered"),
            }
        });
        let mut pending = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|task| !task.is_finished());
        pending.push(task);
        Ok(event)
    }

    /// Waits for every feedback report started by [`DashboardSession::decide`].
    pub async fn flush_feedback(&self) {
        let pending = std::mem::take(
            &mut *self.feedback.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for task in pending {
            if let Err(err) = task.await {
                warn!(error = %err, "feedback task ended abnormally");
            }
        }
    }

    /// Validates and records a manual entry. The service copy is best effort.
    pub async fn add_transaction(&self, draft: TransactionDraft) -> Result<Transaction> {
        let mut transaction =
            TransactionService::validate(&draft, TransactionSource::Manual, today())?;
        match self.api.create_transaction(&transaction).await {
            Ok(id) if id != transaction.id => {
                if self.store.snapshot().ledger.contains(&id) {
                    warn!(%id, "service returned an id already in the ledger; keeping local id");
                } else {
                    transaction = transaction.with_id(id);
                }
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "transaction not stored remotely"),
        }
        self.store
            .dispatch(StoreAction::AddTransaction(transaction.clone()))?;
        self.persist();
        Ok(transaction)
    }

    /// Returns whether the transaction was present locally.
    pub async fn remove_transaction(&self, id: &TransactionId) -> Result<bool> {
        if let Err(err) = self.api.delete_transaction(id).await {
            warn!(%id, error = %err, "transaction not deleted remotely");
        }
        let existed = self.store.snapshot().ledger.contains(id);
        self.store
            .dispatch(StoreAction::RemoveTransaction(id.clone()))?;
        if existed {
            self.persist();
        }
        Ok(existed)
    }

    /// Parses a typed income value, saves it to the profile, and applies it
    /// to the working state. The service copy is best effort.
    pub async fn update_income(&self, raw: &str) -> Result<f64> {
        let income = TransactionService::parse_income(raw)?;
        if let Err(err) = self.api.update_profile(&ProfileUpdate::income(income)).await {
            warn!(error = %err, "income not stored remotely");
        }
        self.store.dispatch(StoreAction::SetIncome(income))?;
        self.persist();
        Ok(income)
    }

    /// Imports CSV rows, parsing locally when the service cannot be reached.
    /// Returns the number of transactions added.
    pub async fn import_csv(&self, csv: &str) -> Result<usize> {
        let imported = match self.api.import_transactions(csv).await {
            Ok(imported) => imported,
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "remote import failed; parsing locally");
                ImportService::parse_csv(csv, today())?
            }
            Err(err) => return Err(err),
        };
        let effect = self
            .store
            .dispatch(StoreAction::ImportTransactions(imported))?;
        let StoreEffect::Imported { added, skipped } = effect else {
            return Ok(0);
        };
        if added > 0 {
            self.persist();
        }
        info!(added, skipped, "transactions imported");
        Ok(added)
    }

    /// Cache first, then the built-in dataset.
    fn fallback_dataset(&self) -> (Dataset, DataOrigin) {
        if let Some(cache) = &self.cache {
            match cache.load() {
                Ok(Some(dataset)) => return (dataset, DataOrigin::Cached),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "ignoring unreadable dataset cache"),
            }
        }
        (Dataset::clone(&self.fallback), DataOrigin::Fixture)
    }

    fn persist(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let Some(dataset) = self.store.snapshot().to_dataset() else {
            return;
        };
        if let Err(err) = cache.save(&dataset) {
            warn!(path = %cache.path().display(), error = %err, "failed to write dataset cache");
        }
    }
}

/// Swallows recoverable failures with a warning and propagates the rest.
fn recover(endpoint: &'static str, err: BudgetError) -> Result<()> {
    if err.is_recoverable() {
        warn!(endpoint, error = %err, "service call failed; falling back");
        Ok(())
    } else {
        Err(err)
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}
