use serde::{Deserialize, Serialize};

use super::{
    category::Category,
    period::Period,
    transaction::{Transaction, TransactionId},
};

/// Ordering applied by [`TransactionLedger::sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Amount,
}

/// Listing parameters mirroring the transactions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub category: Option<Category>,
    pub period: Option<Period>,
    pub limit: Option<usize>,
}

impl TransactionQuery {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }
}

/// Ordered collection of transaction records, most recent first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TransactionLedger {
    entries: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from records already ordered most-recent-first.
    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        let mut ledger = Self::new();
        for txn in entries.into_iter().rev() {
            ledger.add(txn);
        }
        ledger
    }

    /// Inserts at the head. Ids must be unique within the ledger.
    pub fn add(&mut self, transaction: Transaction) {
        debug_assert!(
            !self.contains(&transaction.id),
            "duplicate transaction id {}",
            transaction.id
        );
        self.entries.insert(0, transaction);
    }

    /// Removes the entry with `id`, if present.
    pub fn remove(&mut self, id: &TransactionId) -> Option<Transaction> {
        let index = self.entries.iter().position(|txn| &txn.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.entries.iter().find(|txn| &txn.id == id)
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lazy view restricted to `category`; `None` yields everything.
    pub fn filter(&self, category: Option<Category>) -> impl Iterator<Item = &Transaction> {
        self.entries
            .iter()
            .filter(move |txn| category.map_or(true, |wanted| txn.category == wanted))
    }

    /// Lazy view restricted to entries that occurred inside `period`.
    pub fn in_period(&self, period: Period) -> impl Iterator<Item = &Transaction> {
        self.entries
            .iter()
            .filter(move |txn| period.contains(txn.occurred_at))
    }

    /// New ordered view. Ties keep ledger order.
    pub fn sort(&self, key: SortKey, descending: bool) -> Vec<&Transaction> {
        let mut view: Vec<&Transaction> = self.entries.iter().collect();
        view.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Date => a.occurred_at.cmp(&b.occurred_at),
                SortKey::Amount => a.amount.total_cmp(&b.amount),
            };
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        view
    }

    /// Applies category, period, date-descending order, and limit.
    pub fn query(&self, query: &TransactionQuery) -> Vec<&Transaction> {
        let mut view: Vec<&Transaction> = self
            .sort(SortKey::Date, true)
            .into_iter()
            .filter(|txn| query.category.map_or(true, |wanted| txn.category == wanted))
            .filter(|txn| query.period.map_or(true, |period| period.contains(txn.occurred_at)))
            .collect();
        if let Some(limit) = query.limit {
            view.truncate(limit);
        }
        view
    }

    pub fn into_entries(self) -> Vec<Transaction> {
        self.entries
    }
}
