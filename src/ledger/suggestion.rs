use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::allocation::BudgetAllocation;

/// Model family that produced a suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    QLearning,
    #[default]
    Dqn,
}

impl ModelType {
    pub fn key(self) -> &'static str {
        match self {
            ModelType::QLearning => "q_learning",
            ModelType::Dqn => "dqn",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelType::QLearning => "Q-Learning",
            ModelType::Dqn => "Deep Q-Network",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Lifecycle of a suggestion. Only `Pending` may transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn is_final(self) -> bool {
        !matches!(self, SuggestionStatus::Pending)
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// The user's verdict on a suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub fn status(self) -> SuggestionStatus {
        match self {
            Decision::Accepted => SuggestionStatus::Accepted,
            Decision::Rejected => SuggestionStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.status(), f)
    }
}

/// A proposed allocation change with its recomputed delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RLSuggestion {
    pub id: Uuid,
    pub current_allocation: BudgetAllocation,
    pub suggested_allocation: BudgetAllocation,
    pub delta_allocation: BudgetAllocation,
    pub expected_savings_increase: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub model_type: ModelType,
    #[serde(default)]
    pub status: SuggestionStatus,
}

/// Descriptive fields supplied alongside the two allocations.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionMeta {
    pub expected_savings_increase: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub model_type: ModelType,
}

/// Emitted when a suggestion is decided, so the verdict can be reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionEvent {
    pub suggestion_id: Uuid,
    pub decision: Decision,
}

/// Untrusted suggestion body as the service sends it. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionPayload {
    #[serde(default)]
    pub current_allocation: Option<BudgetAllocation>,
    #[serde(default)]
    pub suggested_allocation: Option<BudgetAllocation>,
    #[serde(default)]
    pub delta_allocation: Option<BudgetAllocation>,
    #[serde(default)]
    pub expected_savings_increase: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub model_type: Option<ModelType>,
}

/// Aggregate figures shown next to a suggestion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionMetrics {
    /// Percentage points moved out of spending categories.
    pub reallocated_from_spending: f64,
    /// Change in the savings share, in percentage points.
    pub savings_delta: f64,
    /// Extra income saved per period if the suggestion is followed.
    pub projected_savings_gain: f64,
}
