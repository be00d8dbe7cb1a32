//! Deterministic in-memory budget service.
//!
//! Serves the February 2026 demo household. Used when the service mode is
//! `fixture` and as the last-resort fallback dataset.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    core::services::{ImportService, SuggestionService, SummaryService},
    errors::Result,
    ledger::{
        BudgetAllocation, BudgetHistoryEntry, BudgetSource, Category, CategoryAmounts, Dataset,
        Decision, ModelType, Period, PeriodSummary, ProfileUpdate, RiskPreference, SuggestionMeta,
        SuggestionPayload, Transaction, TransactionId, TransactionLedger, TransactionQuery,
        TransactionSource, UserProfile,
    },
};

use super::{BudgetApi, SuggestionEnvelope, TransactionPage};

const FIXTURE_SUGGESTION_ID: u128 = 0x6f1c_2b7e_9a4d_4e0b_8c55_3d2a_1f90_7e11;

static FIXTURE: Lazy<Dataset> = Lazy::new(build_dataset);

/// The demo dataset. Identical on every call, including the suggestion id.
pub fn fixture_dataset() -> Dataset {
    FIXTURE.clone()
}

/// February 2026, the month the demo transactions fall in.
pub fn fixture_period() -> Period {
    Period::month_containing(feb(1))
}

fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap_or_default()
}

fn fixture_txn(
    id: &str,
    amount: f64,
    category: Category,
    description: &str,
    (day, hour, minute): (u32, u32, u32),
    source: TransactionSource,
) -> Transaction {
    let date = feb(day);
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    Transaction::new(amount, category, description, date, source)
        .with_id(TransactionId::from(id))
        .with_created_at(Utc.from_utc_datetime(&date.and_time(time)))
}

fn current_allocation() -> BudgetAllocation {
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

fn suggested_allocation() -> BudgetAllocation {
    BudgetAllocation {
        food: 13.0,
        rent: 26.7,
        transport: 6.0,
        shopping: 8.0,
        entertainment: 4.0,
        other: 4.3,
        savings: 38.0,
    }
}

fn build_dataset() -> Dataset {
    use Category::*;
    use TransactionSource::*;

    let profile = UserProfile {
        uid: "demo-user-001".into(),
        email: "demo@rlbudget.com".into(),
        display_name: "Arjun Sharma".into(),
        monthly_income: 75_000.0,
        currency: "INR".into(),
        risk_preference: RiskPreference::Moderate,
        onboarding_complete: true,
    };

    let transactions = vec![
        fixture_txn("txn001", 850.0, Food, "Swiggy dinner order", (11, 19, 30), Manual),
        fixture_txn("txn002", 2_400.0, Food, "BigBasket groceries", (10, 10, 0), Manual),
        fixture_txn("txn003", 20_000.0, Rent, "February rent", (1, 9, 0), Manual),
        fixture_txn("txn004", 1_200.0, Transport, "Uber rides this week", (9, 18, 0), Manual),
        fixture_txn("txn005", 3_500.0, Shopping, "Amazon electronics", (8, 14, 0), Imported),
        fixture_txn("txn006", 500.0, Entertainment, "Netflix subscription", (5, 0, 0), Auto),
        fixture_txn("txn007", 1_800.0, Entertainment, "PVR movie + dinner", (7, 20, 0), Manual),
        fixture_txn("txn008", 750.0, Food, "Zomato lunch", (12, 12, 30), Manual),
        fixture_txn("txn009", 600.0, Transport, "Metro recharge", (6, 8, 0), Manual),
        fixture_txn("txn010", 2_000.0, Other, "Gym membership renewal", (3, 10, 0), Manual),
        fixture_txn("txn011", 1_500.0, Food, "Weekly groceries", (4, 11, 0), Manual),
        fixture_txn("txn012", 4_500.0, Shopping, "Myntra clothing", (2, 16, 0), Imported),
    ];

    let mut suggestion = SuggestionService::build(
        current_allocation(),
        suggested_allocation(),
        SuggestionMeta {
            expected_savings_increase: 0.067,
            confidence: 0.87,
            reasoning: "Based on your Feb spending, food and shopping have room for 2% \
                        reduction each. Your transport costs are trending down, so we can \
                        reallocate to savings. This could increase monthly savings by ₹5,025."
                .into(),
            model_type: ModelType::Dqn,
        },
    );
    suggestion.id = Uuid::from_u128(FIXTURE_SUGGESTION_ID);

    Dataset {
        profile,
        transactions,
        allocation: current_allocation(),
        suggestion: Some(suggestion),
        history: build_history(),
        period: Some(fixture_period()),
    }
}

/// Twelve closed months, February 2025 through January 2026. The last five
/// followed model suggestions.
fn build_history() -> Vec<BudgetHistoryEntry> {
    let mut periods = Vec::with_capacity(12);
    let mut period = fixture_period();
    for _ in 0..12 {
        period = period.previous_month();
        periods.push(period);
    }
    periods.reverse();

    (0u32..)
        .zip(periods)
        .map(|(i, period)| {
            // Fixed spread in [0, 1) so figures vary month to month.
            let spread = f64::from((i * 7) % 12) / 12.0;
            let savings_pct = 18.0 + spread * 12.0;
            BudgetHistoryEntry {
                budget_id: format!("budget-{}", i + 1),
                period_start: period.start,
                period_end: period.end,
                income: 75_000.0,
                allocation: current_allocation(),
                actual_spent: CategoryAmounts::from_iter([
                    (Category::Food, 9_000.0 + spread * 3_000.0),
                    (Category::Rent, 20_000.0),
                    (Category::Transport, 3_000.0 + (1.0 - spread) * 2_000.0),
                    (Category::Shopping, 5_000.0 + spread * 5_000.0),
                    (Category::Entertainment, 2_000.0 + (1.0 - spread) * 3_000.0),
                    (Category::Other, 2_000.0 + spread * 2_000.0),
                    (Category::Savings, savings_pct * 750.0),
                ]),
                source: if i > 6 {
                    BudgetSource::RlSuggested
                } else {
                    BudgetSource::Manual
                },
                savings_rate: savings_pct / 100.0,
            }
        })
        .collect()
}

/// [`BudgetApi`] over a fixed [`Dataset`]. Transaction writes are acknowledged
/// but not kept; profile edits are kept and shared between clones.
#[derive(Debug, Clone)]
pub struct FixtureBudgetApi {
    dataset: Dataset,
    profile: Arc<RwLock<UserProfile>>,
}

impl Default for FixtureBudgetApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBudgetApi {
    pub fn new() -> Self {
        Self::with_dataset(fixture_dataset())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let profile = Arc::new(RwLock::new(dataset.profile.clone()));
        Self { dataset, profile }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn ledger(&self) -> TransactionLedger {
        TransactionLedger::from_entries(self.dataset.transactions.clone())
    }
}

#[async_trait]
impl BudgetApi for FixtureBudgetApi {
    /// The dataset's own period is "current"; `period` is used only when the
    /// dataset has none.
    async fn summary(&self, period: Period) -> Result<PeriodSummary> {
        let income = self.profile.read().await.monthly_income;
        Ok(SummaryService::compute(
            &self.ledger(),
            income,
            &self.dataset.allocation,
            self.dataset.period.unwrap_or(period),
        ))
    }

    async fn suggestion(&self, model_type: ModelType, _period: Period) -> Result<SuggestionEnvelope> {
        let suggestion = self.dataset.suggestion.as_ref().map(|suggestion| SuggestionPayload {
            current_allocation: Some(suggestion.current_allocation),
            suggested_allocation: Some(suggestion.suggested_allocation),
            delta_allocation: Some(suggestion.delta_allocation),
            expected_savings_increase: Some(suggestion.expected_savings_increase),
            confidence: Some(suggestion.confidence),
            reasoning: Some(suggestion.reasoning.clone()),
            model_type: Some(model_type),
        });
        Ok(SuggestionEnvelope {
            success: suggestion.is_some(),
            suggestion,
        })
    }

    async fn feedback(&self, budget_id: &str, decision: Decision) -> Result<()> {
        debug!(budget_id, %decision, "fixture feedback acknowledged");
        Ok(())
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let ledger = self.ledger();
        let total = ledger
            .filter(query.category)
            .filter(|txn| query.period.map_or(true, |period| period.contains(txn.occurred_at)))
            .count();
        let transactions = ledger.query(query).into_iter().cloned().collect();
        Ok(TransactionPage {
            transactions,
            total,
        })
    }

    async fn create_transaction(&self, transaction: &Transaction) -> Result<TransactionId> {
        Ok(transaction.id.clone())
    }

    async fn delete_transaction(&self, _id: &TransactionId) -> Result<()> {
        Ok(())
    }

    async fn import_transactions(&self, csv: &str) -> Result<Vec<Transaction>> {
        ImportService::parse_csv(csv, Utc::now().date_naive())
    }

    async fn history(&self, months: u32) -> Result<Vec<BudgetHistoryEntry>> {
        let entries = &self.dataset.history;
        let keep = (months as usize).min(entries.len());
        Ok(entries[entries.len() - keep..].to_vec())
    }

    async fn profile(&self) -> Result<UserProfile> {
        Ok(self.profile.read().await.clone())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        update.apply_to(&mut *self.profile.write().await);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[tokio::test]
    async fn profile_edits_feed_the_summary() {
        let api = FixtureBudgetApi::new();
        api.update_profile(&ProfileUpdate::income(90_000.0)).await.unwrap();
        assert_eq!(api.profile().await.unwrap().monthly_income, 90_000.0);
        assert_eq!(api.summary(fixture_period()).await.unwrap().income, 90_000.0);
        assert_eq!(api.dataset().profile.monthly_income, 75_000.0);
    }

    #[test]
    fn dataset_is_deterministic() {
        assert_eq!(fixture_dataset(), fixture_dataset());
    }

    #[test]
    fn february_spend_totals_39600() {
        let dataset = fixture_dataset();
        let ledger = TransactionLedger::from_entries(dataset.transactions);
        let summary = SummaryService::compute(
            &ledger,
            dataset.profile.monthly_income,
            &dataset.allocation,
            fixture_period(),
        );
        assert_eq!(summary.total_spent, 39_600.0);
        assert!((summary.savings_rate - 0.472).abs() < 1e-9);
    }

    #[test]
    fn history_is_ordered_and_monthly() {
        let history = fixture_dataset().history;
        assert_eq!(history.len(), 12);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].period_start < pair[1].period_start));
        assert_eq!(history[0].period_start.month(), 2);
        assert_eq!(history[11].period_end, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[tokio::test]
    async fn history_returns_most_recent_months() {
        let api = FixtureBudgetApi::new();
        let recent = api.history(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].budget_id, "budget-12");
    }

    #[tokio::test]
    async fn suggestion_round_trips_through_validation() {
        let api = FixtureBudgetApi::new();
        let suggestion = api
            .suggestion(ModelType::QLearning, fixture_period())
            .await
            .unwrap()
            .into_suggestion()
            .unwrap();
        assert_eq!(suggestion.model_type, ModelType::QLearning);
        assert!((suggestion.delta_allocation.food + 2.0).abs() < 1e-9);
    }
}
