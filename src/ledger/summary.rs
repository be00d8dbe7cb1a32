use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{category::Category, period::Period};

/// Lower and upper bound used when presenting a savings rate.
pub const SAVINGS_RATE_DISPLAY_RANGE: (f64, f64) = (-1.0, 1.0);

/// Spend versus plan for one category within a period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CategorySpend {
    pub spent: f64,
    pub budget: f64,
    pub percentage: f64,
}

impl CategorySpend {
    pub fn remaining(&self) -> f64 {
        self.budget - self.spent
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.budget
    }
}

/// Derived view of one period. Never stored as a source of truth; recomputed
/// from the ledger, income, and allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub income: f64,
    pub total_spent: f64,
    /// Fraction of income left after spending. Negative means overspend.
    pub savings_rate: f64,
    pub category_breakdown: BTreeMap<Category, CategorySpend>,
}

impl PeriodSummary {
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            income: 0.0,
            total_spent: 0.0,
            savings_rate: 0.0,
            category_breakdown: Category::ALL
                .into_iter()
                .map(|category| (category, CategorySpend::default()))
                .collect(),
        }
    }

    pub fn category(&self, category: Category) -> CategorySpend {
        self.category_breakdown
            .get(&category)
            .copied()
            .unwrap_or_default()
    }

    /// Savings rate clamped for presentation.
    pub fn display_savings_rate(&self) -> f64 {
        let (low, high) = SAVINGS_RATE_DISPLAY_RANGE;
        self.savings_rate.clamp(low, high)
    }

    pub fn remaining_income(&self) -> f64 {
        self.income - self.total_spent
    }

    pub fn over_budget_categories(&self) -> Vec<Category> {
        self.category_breakdown
            .iter()
            .filter(|(category, spend)| category.is_spending() && spend.is_over_budget())
            .map(|(category, _)| *category)
            .collect()
    }
}
