mod common;

use common::{feb_period, household_allocation};
use rl_budget_core::{
    core::{
        services::SuggestionService, AppState, AppStore, StoreAction, SuggestionUiStatus,
    },
    errors::BudgetError,
    ledger::{
        BudgetAllocation, Category, Decision, ModelType, SuggestionMeta, SuggestionPayload,
        SuggestionStatus,
    },
};

fn leaner_food() -> BudgetAllocation {
    BudgetAllocation {
        food: 13.0,
        savings: 33.3,
        ..household_allocation()
    }
}

fn meta() -> SuggestionMeta {
    SuggestionMeta {
        expected_savings_increase: 0.02,
        confidence: 0.9,
        reasoning: "Food has room for a 2% reduction.".into(),
        model_type: ModelType::Dqn,
    }
}

#[test]
fn delta_is_suggested_minus_current() {
    let suggestion = SuggestionService::build(household_allocation(), leaner_food(), meta());
    assert_eq!(suggestion.delta_allocation.food, -2.0);
    for category in Category::ALL {
        assert_eq!(
            suggestion.delta_allocation[category],
            suggestion.suggested_allocation[category] - suggestion.current_allocation[category]
        );
    }
}

#[test]
fn malformed_delta_is_recomputed() {
    let bogus = BudgetAllocation {
        food: 40.0,
        rent: -12.0,
        ..BudgetAllocation::default()
    };
    let payload = SuggestionPayload {
        current_allocation: Some(household_allocation()),
        suggested_allocation: Some(leaner_food()),
        delta_allocation: Some(bogus),
        confidence: Some(0.5),
        ..SuggestionPayload::default()
    };
    let suggestion = SuggestionService::from_payload(payload).unwrap();
    assert_eq!(suggestion.delta_allocation.food, -2.0);
    assert_eq!(suggestion.delta_allocation.rent, 0.0);
    assert_eq!(suggestion.status, SuggestionStatus::Pending);
}

#[test]
fn decision_is_one_way() {
    let mut suggestion = SuggestionService::build(household_allocation(), leaner_food(), meta());
    assert_eq!(
        SuggestionService::record_decision(&mut suggestion, Decision::Accepted).unwrap(),
        SuggestionStatus::Accepted
    );
    let err = SuggestionService::record_decision(&mut suggestion, Decision::Rejected)
        .expect_err("already decided");
    assert!(matches!(
        err,
        BudgetError::SuggestionFinalized(SuggestionStatus::Accepted)
    ));
    assert_eq!(suggestion.status, SuggestionStatus::Accepted);
}

#[test]
fn accepting_updates_working_allocation() {
    let store = AppStore::new(AppState::new(feb_period()));
    store
        .dispatch(StoreAction::SetAllocation(household_allocation()))
        .unwrap();
    store.dispatch(StoreAction::SetIncome(75_000.0)).unwrap();
    store
        .dispatch(StoreAction::SetSuggestion(Some(SuggestionService::build(
            household_allocation(),
            leaner_food(),
            meta(),
        ))))
        .unwrap();

    store
        .dispatch(StoreAction::DecideSuggestion(Decision::Accepted))
        .unwrap();

    let state = store.snapshot();
    assert_eq!(state.allocation.food, 13.0);
    assert!(state.suggestion.is_none());
    assert_eq!(state.suggestion_status, SuggestionUiStatus::Accepted);
    assert_eq!(state.summary.category(Category::Food).budget, 9_750.0);
}

#[test]
fn rejecting_keeps_allocation() {
    let store = AppStore::new(AppState::new(feb_period()));
    store
        .dispatch(StoreAction::SetAllocation(household_allocation()))
        .unwrap();
    store
        .dispatch(StoreAction::SetSuggestion(Some(SuggestionService::build(
            household_allocation(),
            leaner_food(),
            meta(),
        ))))
        .unwrap();

    store
        .dispatch(StoreAction::DecideSuggestion(Decision::Rejected))
        .unwrap();

    let state = store.snapshot();
    assert_eq!(state.allocation, household_allocation());
    assert!(state.suggestion.is_none());
    assert_eq!(state.suggestion_status, SuggestionUiStatus::Rejected);
}
