use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::category::Category;

/// Allowed drift, in percentage points, between an allocation's total and 100.
pub const DEFAULT_ALLOCATION_TOLERANCE: f64 = 0.5;

/// Percentage of income earmarked per category for a period.
///
/// The seven shares are expected to add up to 100, but producers round, so
/// consumers check the total against a tolerance instead of asserting equality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BudgetAllocation {
    #[serde(default)]
    pub food: f64,
    #[serde(default)]
    pub rent: f64,
    #[serde(default)]
    pub transport: f64,
    #[serde(default)]
    pub shopping: f64,
    #[serde(default)]
    pub entertainment: f64,
    #[serde(default)]
    pub other: f64,
    #[serde(default)]
    pub savings: f64,
}

/// Result of checking an allocation's total against the expected 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationCheck {
    pub total: f64,
    pub deviation: f64,
    pub within_tolerance: bool,
}

impl BudgetAllocation {
    pub fn from_fn(mut value: impl FnMut(Category) -> f64) -> Self {
        let mut allocation = Self::default();
        for category in Category::ALL {
            allocation[category] = value(category);
        }
        allocation
    }

    pub fn get(&self, category: Category) -> f64 {
        self[category]
    }

    pub fn set(&mut self, category: Category, value: f64) {
        self[category] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self[category]))
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, value)| value).sum()
    }

    /// Per-category `self - baseline`.
    pub fn minus(&self, baseline: &BudgetAllocation) -> BudgetAllocation {
        BudgetAllocation::from_fn(|category| self[category] - baseline[category])
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, value)| value.is_finite())
    }

    pub fn check(&self, tolerance: f64) -> AllocationCheck {
        let total = self.total();
        let deviation = total - 100.0;
        AllocationCheck {
            total,
            deviation,
            within_tolerance: deviation.abs() <= tolerance,
        }
    }
}

impl Index<Category> for BudgetAllocation {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        match category {
            Category::Food => &self.food,
            Category::Rent => &self.rent,
            Category::Transport => &self.transport,
            Category::Shopping => &self.shopping,
            Category::Entertainment => &self.entertainment,
            Category::Other => &self.other,
            Category::Savings => &self.savings,
        }
    }
}

impl IndexMut<Category> for BudgetAllocation {
    fn index_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Food => &mut self.food,
            Category::Rent => &mut self.rent,
            Category::Transport => &mut self.transport,
            Category::Shopping => &mut self.shopping,
            Category::Entertainment => &mut self.entertainment,
            Category::Other => &mut self.other,
            Category::Savings => &mut self.savings,
        }
    }
}
