//! Derivation of period summaries from the ledger.

use std::collections::BTreeMap;

use tracing::warn;

use crate::ledger::{
    BudgetAllocation, Category, CategoryAmounts, CategorySpend, Period, PeriodSummary,
    TransactionLedger, DEFAULT_ALLOCATION_TOLERANCE,
};

/// Pure summary calculations.
///
/// See also: [`crate::ledger::PeriodSummary`] for the returned data model.
pub struct SummaryService;

impl SummaryService {
    /// Computes spend, budget, and savings figures for `period`.
    ///
    /// Deterministic: amounts are accumulated in ledger order and the breakdown
    /// is keyed by category, so identical inputs give identical output.
    pub fn compute(
        ledger: &TransactionLedger,
        income: f64,
        allocation: &BudgetAllocation,
        period: Period,
    ) -> PeriodSummary {
        Self::compute_with_tolerance(ledger, income, allocation, period, DEFAULT_ALLOCATION_TOLERANCE)
    }

    pub fn compute_with_tolerance(
        ledger: &TransactionLedger,
        income: f64,
        allocation: &BudgetAllocation,
        period: Period,
        tolerance: f64,
    ) -> PeriodSummary {
        let check = allocation.check(tolerance);
        if !check.within_tolerance {
            warn!(
                total = check.total,
                deviation = check.deviation,
                "allocation does not sum to 100"
            );
        }

        let mut spent = CategoryAmounts::new();
        for txn in ledger.in_period(period) {
            spent.add(txn.category, txn.amount);
        }

        let has_income = income != 0.0;
        let category_breakdown: BTreeMap<Category, CategorySpend> = Category::ALL
            .into_iter()
            .map(|category| {
                let entry = CategorySpend {
                    spent: spent[category],
                    budget: income * allocation[category] / 100.0,
                    percentage: if has_income {
                        spent[category] / income * 100.0
                    } else {
                        0.0
                    },
                };
                (category, entry)
            })
            .collect();

        let total_spent = spent.spending_total();
        let savings_rate = if has_income {
            (income - total_spent) / income
        } else {
            0.0
        };

        PeriodSummary {
            period,
            income,
            total_spent,
            savings_rate,
            category_breakdown,
        }
    }

    /// Sum of `category` amounts inside `period`, taken straight from the ledger.
    pub fn category_spent(ledger: &TransactionLedger, category: Category, period: Period) -> f64 {
        ledger
            .filter(Some(category))
            .filter(|txn| period.contains(txn.occurred_at))
            .map(|txn| txn.amount)
            .sum()
    }
}
