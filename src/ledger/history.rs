use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{BudgetError, Result};

use super::{allocation::BudgetAllocation, amounts::CategoryAmounts, transaction::calendar_date};

/// Default number of periods kept in memory.
pub const DEFAULT_HISTORY_CAPACITY: usize = 24;

/// Who authored the allocation used in a past period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSource {
    #[default]
    Manual,
    RlSuggested,
}

/// One closed period's plan and outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetHistoryEntry {
    pub budget_id: String,
    #[serde(with = "calendar_date")]
    pub period_start: NaiveDate,
    #[serde(with = "calendar_date")]
    pub period_end: NaiveDate,
    pub income: f64,
    pub allocation: BudgetAllocation,
    /// Amounts actually spent per category.
    pub actual_spent: CategoryAmounts,
    #[serde(default)]
    pub source: BudgetSource,
    pub savings_rate: f64,
}

/// Bounded, append-only list of history entries ordered by period start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetHistory {
    entries: Vec<BudgetHistoryEntry>,
    capacity: usize,
}

impl Default for BudgetHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl BudgetHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Replaces the contents with `entries`, sorted and trimmed to capacity.
    pub fn replace(&mut self, mut entries: Vec<BudgetHistoryEntry>) {
        entries.sort_by_key(|entry| entry.period_start);
        self.entries = entries;
        self.enforce_capacity();
    }

    /// Appends an entry that starts after the latest one.
    pub fn append(&mut self, entry: BudgetHistoryEntry) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if entry.period_start <= last.period_start {
                return Err(BudgetError::HistoryOutOfOrder(format!(
                    "{} starts {} which is not after {}",
                    entry.budget_id, entry.period_start, last.period_start
                )));
            }
        }
        self.entries.push(entry);
        self.enforce_capacity();
        Ok(())
    }

    pub fn entries(&self) -> &[BudgetHistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&BudgetHistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn average_savings_rate(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|entry| entry.savings_rate).sum();
        Some(sum / self.entries.len() as f64)
    }

    fn enforce_capacity(&mut self) {
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
    }
}
