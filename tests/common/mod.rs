#![allow(dead_code)]

use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rl_budget_core::{
    client::{fixture_dataset, BudgetApi, FixtureBudgetApi, SuggestionEnvelope, TransactionPage},
    config::ConfigManager,
    errors::{BudgetError, Result},
    ledger::{
        BudgetAllocation, BudgetHistoryEntry, Category, Decision, ModelType, Period,
        PeriodSummary, ProfileUpdate, Transaction, TransactionId, TransactionQuery,
        TransactionSource, UserProfile,
    },
    utils::persistence::DatasetCache,
};
use tempfile::TempDir;
use tokio::sync::{oneshot, Notify};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated config manager and dataset cache for each test.
pub fn setup_test_env() -> (ConfigManager, DatasetCache) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let cache = DatasetCache::new(config_manager.default_cache_path());
    (config_manager, cache)
}

pub fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

pub fn feb_period() -> Period {
    Period::month_containing(feb(1))
}

pub fn txn(amount: f64, category: Category, day: u32) -> Transaction {
    Transaction::new(
        amount,
        category,
        format!("{} spend", category.label()),
        feb(day),
        TransactionSource::Manual,
    )
}

pub fn household_allocation() -> BudgetAllocation {
    BudgetAllocation {
        food: 15.0,
        rent: 26.7,
        transport: 7.0,
        shopping: 10.0,
        entertainment: 5.0,
        other: 5.0,
        savings: 31.3,
    }
}

/// Queue of held responses for one endpoint. Calls take the oldest held slot
/// and wait for it; with nothing held they answer straight away.
pub struct Hold<T> {
    queue: Mutex<VecDeque<oneshot::Receiver<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Hold<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Hold<T> {
    pub fn hold(&self) -> oneshot::Sender<T> {
        let (sender, receiver) = oneshot::channel();
        self.queue.lock().unwrap().push_back(receiver);
        sender
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, count: usize) {
        while self.calls() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn answer<F>(&self, otherwise: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let held = self.queue.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match held {
            Some(receiver) => receiver
                .await
                .map_err(|_| BudgetError::ServiceUnavailable("response dropped".into())),
            None => otherwise.await,
        }
    }
}

/// Fixture-backed service with scriptable responses. Feedback fails unless a
/// delivery delay is configured.
#[derive(Default)]
pub struct ScriptedApi {
    inner: FixtureBudgetApi,
    pub summaries: Hold<PeriodSummary>,
    pub suggestions: Hold<SuggestionEnvelope>,
    pub listings: Hold<TransactionPage>,
    pub histories: Hold<Vec<BudgetHistoryEntry>>,
    /// Rows per page when the caller sets no limit; 0 means unlimited.
    default_page_size: AtomicUsize,
    /// Rows per page regardless of the requested limit; 0 means uncapped.
    page_cap: AtomicUsize,
    import_reply: Mutex<Option<Vec<Transaction>>>,
    feedback_delay: Option<Duration>,
    feedback_delivered: AtomicBool,
    pub feedback_attempted: Notify,
}

impl ScriptedApi {
    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = Some(delay);
        self
    }

    pub fn feedback_delivered(&self) -> bool {
        self.feedback_delivered.load(Ordering::SeqCst)
    }

    pub fn set_default_page_size(&self, rows: usize) {
        self.default_page_size.store(rows, Ordering::SeqCst);
    }

    pub fn cap_pages(&self, rows: usize) {
        self.page_cap.store(rows, Ordering::SeqCst);
    }

    pub fn reply_to_import(&self, transactions: Vec<Transaction>) {
        *self.import_reply.lock().unwrap() = Some(transactions);
    }

    pub fn hold_suggestion(&self) -> oneshot::Sender<SuggestionEnvelope> {
        self.suggestions.hold()
    }

    pub async fn wait_for_suggestion_calls(&self, count: usize) {
        self.suggestions.wait_for_calls(count).await
    }

    pub async fn envelope(model_type: ModelType) -> SuggestionEnvelope {
        FixtureBudgetApi::new()
            .suggestion(model_type, feb_period())
            .await
            .unwrap()
    }

    pub async fn summary_with_income(income: f64) -> PeriodSummary {
        let mut summary = FixtureBudgetApi::new().summary(feb_period()).await.unwrap();
        summary.income = income;
        summary
    }

    /// The first `rows` fixture transactions, reported as a complete listing.
    pub fn page_of(rows: usize) -> TransactionPage {
        let mut transactions = fixture_dataset().transactions;
        transactions.truncate(rows);
        TransactionPage {
            total: transactions.len(),
            transactions,
        }
    }

    pub fn history_of(months: usize) -> Vec<BudgetHistoryEntry> {
        let history = fixture_dataset().history;
        history[history.len() - months..].to_vec()
    }
}

#[async_trait]
impl BudgetApi for ScriptedApi {
    async fn summary(&self, period: Period) -> Result<PeriodSummary> {
        self.summaries.answer(self.inner.summary(period)).await
    }

    async fn suggestion(&self, model_type: ModelType, period: Period) -> Result<SuggestionEnvelope> {
        self.suggestions
            .answer(self.inner.suggestion(model_type, period))
            .await
    }

    async fn feedback(&self, _budget_id: &str, _decision: Decision) -> Result<()> {
        self.feedback_attempted.notify_one();
        match self.feedback_delay {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                self.feedback_delivered.store(true, Ordering::SeqCst);
                Ok(())
            }
            None => Err(BudgetError::ServiceUnavailable("feedback endpoint down".into())),
        }
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let mut query = query.clone();
        let page_size = self.default_page_size.load(Ordering::SeqCst);
        if query.limit.is_none() && page_size > 0 {
            query.limit = Some(page_size);
        }
        let mut page = self.listings.answer(self.inner.transactions(&query)).await?;
        let cap = self.page_cap.load(Ordering::SeqCst);
        if cap > 0 {
            page.transactions.truncate(cap);
        }
        Ok(page)
    }

    async fn create_transaction(&self, transaction: &Transaction) -> Result<TransactionId> {
        self.inner.create_transaction(transaction).await
    }

    async fn delete_transaction(&self, id: &TransactionId) -> Result<()> {
        self.inner.delete_transaction(id).await
    }

    async fn import_transactions(&self, csv: &str) -> Result<Vec<Transaction>> {
        let reply = self.import_reply.lock().unwrap().take();
        match reply {
            Some(transactions) => Ok(transactions),
            None => self.inner.import_transactions(csv).await,
        }
    }

    async fn history(&self, months: u32) -> Result<Vec<BudgetHistoryEntry>> {
        self.histories.answer(self.inner.history(months)).await
    }

    async fn profile(&self) -> Result<UserProfile> {
        self.inner.profile().await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.inner.update_profile(update).await
    }
}
