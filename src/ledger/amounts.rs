use std::{collections::BTreeMap, ops::Index};

use serde::{Deserialize, Serialize};

use super::category::Category;

/// Currency amounts keyed by category. Missing categories read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CategoryAmounts(BTreeMap<Category, f64>);

impl CategoryAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: Category, amount: f64) {
        *self.0.entry(category).or_insert(0.0) += amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self[category]))
    }

    /// Sum over the spending categories; savings is excluded.
    pub fn spending_total(&self) -> f64 {
        Category::spending().map(|category| self[category]).sum()
    }
}

impl Index<Category> for CategoryAmounts {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        self.0.get(&category).unwrap_or(&0.0)
    }
}

impl FromIterator<(Category, f64)> for CategoryAmounts {
    fn from_iter<I: IntoIterator<Item = (Category, f64)>>(iter: I) -> Self {
        let mut amounts = Self::new();
        for (category, amount) in iter {
            amounts.add(category, amount);
        }
        amounts
    }
}
