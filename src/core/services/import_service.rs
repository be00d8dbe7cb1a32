//! Bulk CSV ingestion into validated transactions.

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::info;

use crate::{
    errors::{BudgetError, Result},
    ledger::{Category, Transaction, TransactionSource},
};

use super::transaction_service::{TransactionDraft, TransactionService};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: String,
    #[serde(alias = "Amount", alias = "AMOUNT")]
    amount: String,
    #[serde(alias = "Category", alias = "CATEGORY")]
    category: String,
    #[serde(default, alias = "Description", alias = "DESCRIPTION")]
    description: Option<String>,
}

pub struct ImportService;

impl ImportService {
    /// Parses `date,amount,category[,description]` rows.
    ///
    /// All-or-nothing: the first invalid row fails the whole import with its
    /// line number. Missing descriptions default to the category label.
    pub fn parse_csv(input: &str, today: NaiveDate) -> Result<Vec<Transaction>> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(input.as_bytes());

        let headers = reader.headers()?.clone();
        let mut imported = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            let row: CsvRow = record.deserialize(Some(&headers))?;
            let description = match row.description.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => row
                    .category
                    .parse::<Category>()
                    .map(|category| category.label().to_string())
                    .unwrap_or_default(),
            };
            let draft = TransactionDraft::new(row.amount, row.category, description, row.date);
            let txn = TransactionService::validate(&draft, TransactionSource::Imported, today)
                .map_err(|err| match err {
                    BudgetError::InvalidInput(message) => BudgetError::Import { line, message },
                    other => other,
                })?;
            imported.push(txn);
        }

        // Newest first, matching ledger order.
        imported.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        info!(count = imported.len(), "parsed CSV import");
        Ok(imported)
    }
}
