//! Budget domain models: categories, the transaction ledger, allocations,
//! derived summaries, suggestions, and history.

pub mod allocation;
pub mod amounts;
pub mod category;
pub mod history;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod period;
pub mod profile;
pub mod suggestion;
pub mod summary;
pub mod transaction;

use serde::{Deserialize, Serialize};

pub use allocation::{AllocationCheck, BudgetAllocation, DEFAULT_ALLOCATION_TOLERANCE};
pub use amounts::CategoryAmounts;
pub use category::{Category, CategoryMeta};
pub use history::{BudgetHistory, BudgetHistoryEntry, BudgetSource, DEFAULT_HISTORY_CAPACITY};
pub use ledger::{SortKey, TransactionLedger, TransactionQuery};
pub use period::Period;
pub use profile::{ProfileUpdate, RiskPreference, UserProfile};
pub use suggestion::{
    Decision, DecisionEvent, ModelType, RLSuggestion, SuggestionMeta, SuggestionMetrics,
    SuggestionPayload, SuggestionStatus,
};
pub use summary::{CategorySpend, PeriodSummary};
pub use transaction::{Transaction, TransactionId, TransactionSource};

/// Everything needed to render the dashboard without a live service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub profile: UserProfile,
    pub transactions: Vec<Transaction>,
    pub allocation: BudgetAllocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<RLSuggestion>,
    #[serde(default)]
    pub history: Vec<BudgetHistoryEntry>,
    /// Period the dataset was captured for, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl Dataset {
    /// Copy suitable for persisting: suggestions are single-use and never cached.
    pub fn without_suggestion(&self) -> Self {
        Self {
            suggestion: None,
            ..self.clone()
        }
    }
}
