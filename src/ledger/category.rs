use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::BudgetError;

/// The closed set of budgeting categories.
///
/// Unknown category strings coming off the wire deserialize as [`Category::Other`];
/// use [`FromStr`] where unknown input must be rejected instead.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Rent,
    Transport,
    Shopping,
    Entertainment,
    Other,
    Savings,
}

/// Presentation metadata attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMeta {
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Rent,
        Category::Transport,
        Category::Shopping,
        Category::Entertainment,
        Category::Other,
        Category::Savings,
    ];

    /// Categories that count toward spending. Savings is derived headroom.
    pub fn spending() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|category| category.is_spending())
    }

    pub fn is_spending(self) -> bool {
        !matches!(self, Category::Savings)
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Rent => "rent",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
            Category::Savings => "savings",
        }
    }

    pub fn meta(self) -> CategoryMeta {
        match self {
            Category::Food => CategoryMeta {
                label: "Food & Dining",
                icon: "🍽️",
                color: "#f59e0b",
            },
            Category::Rent => CategoryMeta {
                label: "Rent / Housing",
                icon: "🏠",
                color: "#6366f1",
            },
            Category::Transport => CategoryMeta {
                label: "Transport",
                icon: "🚗",
                color: "#06b6d4",
            },
            Category::Shopping => CategoryMeta {
                label: "Shopping",
                icon: "🛍️",
                color: "#f43f5e",
            },
            Category::Entertainment => CategoryMeta {
                label: "Entertainment",
                icon: "🎬",
                color: "#8b5cf6",
            },
            Category::Other => CategoryMeta {
                label: "Other",
                icon: "📦",
                color: "#94a3b8",
            },
            Category::Savings => CategoryMeta {
                label: "Savings",
                icon: "💰",
                color: "#10b981",
            },
        }
    }

    pub fn label(self) -> &'static str {
        self.meta().label
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = BudgetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.key() == needle)
            .ok_or_else(|| BudgetError::InvalidInput(format!("unknown category `{}`", value)))
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(Category::Other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_is_not_a_spending_category() {
        let spending: Vec<_> = Category::spending().collect();
        assert_eq!(spending.len(), 6);
        assert!(!spending.contains(&Category::Savings));
    }

    #[test]
    fn parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("  Food ".parse::<Category>().unwrap(), Category::Food);
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn unknown_wire_category_falls_back_to_other() {
        let parsed: Category = serde_json::from_str("\"synthetic\"").unwrap();
        assert_eq!(parsed, Category::Other);
        let known: Category = serde_json::from_str("\"savings\"").unwrap();
        assert_eq!(known, Category::Savings);
    }

    #[test]
    fn serialized_keys_read_back_in_display_order() {
        let encoded = serde_json::to_string(&Category::ALL).unwrap();
        assert_eq!(
            encoded,
            r#"["food","rent","transport","shopping","entertainment","other","savings"]"#
        );
        let decoded: Vec<Category> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, Category::ALL.to_vec());
        assert!(serde_json::from_str::<Category>("7").is_err());
    }
}
