//! Suggestion construction, validation, and the accept/reject transition.

use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::{BudgetError, Result},
    ledger::{
        BudgetAllocation, Category, Decision, RLSuggestion, SuggestionMeta, SuggestionMetrics,
        SuggestionPayload, SuggestionStatus,
    },
};

/// Tolerance used when comparing a supplied delta with the recomputed one.
const DELTA_EPSILON: f64 = 1e-6;

pub struct SuggestionService;

impl SuggestionService {
    /// Builds a pending suggestion. The delta is always `suggested - current`.
    pub fn build(
        current: BudgetAllocation,
        suggested: BudgetAllocation,
        meta: SuggestionMeta,
    ) -> RLSuggestion {
        RLSuggestion {
            id: Uuid::new_v4(),
            delta_allocation: suggested.minus(&current),
            current_allocation: current,
            suggested_allocation: suggested,
            expected_savings_increase: meta.expected_savings_increase,
            confidence: meta.confidence,
            reasoning: meta.reasoning,
            model_type: meta.model_type,
            status: SuggestionStatus::Pending,
        }
    }

    /// Converts an untrusted payload into a suggestion.
    ///
    /// Missing allocations, non-finite numbers, or a confidence outside `[0, 1]`
    /// are rejected. A supplied delta is never trusted.
    pub fn from_payload(payload: SuggestionPayload) -> Result<RLSuggestion> {
        let current = payload.current_allocation.ok_or_else(|| {
            BudgetError::InvalidSuggestion("missing currentAllocation".into())
        })?;
        let suggested = payload.suggested_allocation.ok_or_else(|| {
            BudgetError::InvalidSuggestion("missing suggestedAllocation".into())
        })?;
        if !current.is_finite() || !suggested.is_finite() {
            return Err(BudgetError::InvalidSuggestion(
                "allocation contains non-finite values".into(),
            ));
        }

        let confidence = payload.confidence.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(BudgetError::InvalidSuggestion(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        let expected_savings_increase = payload.expected_savings_increase.unwrap_or(0.0);
        if !expected_savings_increase.is_finite() {
            return Err(BudgetError::InvalidSuggestion(
                "expectedSavingsIncrease is not finite".into(),
            ));
        }

        let suggestion = Self::build(
            current,
            suggested,
            SuggestionMeta {
                expected_savings_increase,
                confidence,
                reasoning: payload.reasoning.unwrap_or_default(),
                model_type: payload.model_type.unwrap_or_default(),
            },
        );

        if let Some(supplied) = payload.delta_allocation {
            let mismatched: Vec<Category> = Category::ALL
                .into_iter()
                .filter(|category| {
                    let diff = supplied[*category] - suggestion.delta_allocation[*category];
                    diff.is_nan() || diff.abs() > DELTA_EPSILON
                })
                .collect();
            if !mismatched.is_empty() {
                warn!(?mismatched, "supplied delta disagrees with allocations; recomputed");
            }
        }

        Ok(suggestion)
    }

    /// Moves a pending suggestion to its final state. Finalized suggestions
    /// are left untouched and an error is returned.
    pub fn record_decision(
        suggestion: &mut RLSuggestion,
        decision: Decision,
    ) -> Result<SuggestionStatus> {
        if suggestion.status.is_final() {
            return Err(BudgetError::SuggestionFinalized(suggestion.status));
        }
        suggestion.status = decision.status();
        Ok(suggestion.status)
    }

    pub fn metrics(suggestion: &RLSuggestion, income: f64) -> SuggestionMetrics {
        let reallocated_from_spending: f64 = Category::spending()
            .map(|category| suggestion.delta_allocation[category])
            .filter(|delta| *delta < 0.0)
            .map(f64::abs)
            .sum();
        let savings_delta = suggestion.delta_allocation[Category::Savings];
        SuggestionMetrics {
            reallocated_from_spending,
            savings_delta,
            projected_savings_gain: income * savings_delta / 100.0,
        }
    }
}
