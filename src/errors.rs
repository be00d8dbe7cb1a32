use std::result::Result as StdResult;

use thiserror::Error;

use crate::ledger::SuggestionStatus;

/// Unified error type for the budget core, its service seam, and storage.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Unexpected service response: {0}")]
    InvalidResponse(String),
    #[error("Invalid suggestion: {0}")]
    InvalidSuggestion(String),
    #[error("Suggestion already {0}")]
    SuggestionFinalized(SuggestionStatus),
    #[error("No active suggestion")]
    NoActiveSuggestion,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Import failed at line {line}: {message}")]
    Import { line: u64, message: String },
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("History entry out of order: {0}")]
    HistoryOutOfOrder(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, BudgetError>;

impl BudgetError {
    /// Failures that the session recovers from by substituting local data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BudgetError::ServiceUnavailable(_)
                | BudgetError::InvalidResponse(_)
                | BudgetError::InvalidSuggestion(_)
        )
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        BudgetError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        BudgetError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for BudgetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BudgetError::InvalidResponse(err.to_string())
        } else {
            BudgetError::ServiceUnavailable(err.to_string())
        }
    }
}

impl From<csv::Error> for BudgetError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line()).unwrap_or(0);
        BudgetError::Import {
            line,
            message: err.to_string(),
        }
    }
}
