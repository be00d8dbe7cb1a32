//! Input-boundary validation for user-entered records.
//!
//! Everything past this module assumes validated values.

use chrono::NaiveDate;

use crate::{
    errors::{BudgetError, Result},
    ledger::{transaction::calendar_date, Category, Transaction, TransactionSource},
};

/// Raw form fields for a new transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub amount: String,
    pub category: String,
    pub description: String,
    /// `YYYY-MM-DD` or RFC 3339. Empty means `today`.
    pub date: String,
}

impl TransactionDraft {
    pub fn new(
        amount: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            category: category.into(),
            description: description.into(),
            date: date.into(),
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    /// Turns a draft into a transaction dated `today` when no date is given.
    pub fn validate(
        draft: &TransactionDraft,
        source: TransactionSource,
        today: NaiveDate,
    ) -> Result<Transaction> {
        let amount = Self::parse_amount(&draft.amount)?;
        let category: Category = draft.category.parse()?;
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(BudgetError::InvalidInput("description must not be empty".into()));
        }
        let occurred_at = if draft.date.trim().is_empty() {
            today
        } else {
            calendar_date::parse(&draft.date).ok_or_else(|| {
                BudgetError::InvalidInput(format!("invalid date `{}`", draft.date.trim()))
            })?
        };
        Ok(Transaction::new(
            amount,
            category,
            description,
            occurred_at,
            source,
        ))
    }

    /// Strictly positive, finite amount. Thousands separators are accepted.
    pub fn parse_amount(raw: &str) -> Result<f64> {
        let cleaned: String = raw.trim().chars().filter(|ch| *ch != ',').collect();
        let amount: f64 = cleaned
            .parse()
            .map_err(|_| BudgetError::InvalidInput(format!("amount `{}` is not a number", raw.trim())))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BudgetError::InvalidInput(format!(
                "amount must be positive, got `{}`",
                raw.trim()
            )));
        }
        Ok(amount)
    }

    /// Non-negative, finite monthly income.
    pub fn parse_income(raw: &str) -> Result<f64> {
        let cleaned: String = raw.trim().chars().filter(|ch| *ch != ',').collect();
        let income: f64 = cleaned
            .parse()
            .map_err(|_| BudgetError::InvalidInput(format!("income `{}` is not a number", raw.trim())))?;
        if !income.is_finite() || income < 0.0 {
            return Err(BudgetError::InvalidInput(format!(
                "income must be zero or more, got `{}`",
                raw.trim()
            )));
        }
        Ok(income)
    }
}
