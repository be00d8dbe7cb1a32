mod common;

use common::{feb, feb_period, household_allocation, txn};
use rl_budget_core::{
    core::services::SummaryService,
    ledger::{BudgetAllocation, Category, SortKey, TransactionLedger},
};

fn varied_ledger() -> TransactionLedger {
    let mut ledger = TransactionLedger::new();
    let entries = [
        (850.0, Category::Food, 11),
        (20_000.0, Category::Rent, 1),
        (1_200.0, Category::Transport, 9),
        (3_500.0, Category::Shopping, 8),
        (1_800.0, Category::Entertainment, 7),
        (2_000.0, Category::Other, 3),
        (5_000.0, Category::Savings, 2),
        (750.0, Category::Food, 12),
    ];
    for (amount, category, day) in entries {
        ledger.add(txn(amount, category, day));
    }
    ledger
}

#[test]
fn end_to_end_food_and_rent() {
    let mut ledger = TransactionLedger::new();
    ledger.add(txn(850.0, Category::Food, 11));
    ledger.add(txn(20_000.0, Category::Rent, 1));

    let summary = SummaryService::compute(&ledger, 75_000.0, &household_allocation(), feb_period());
    assert_eq!(summary.total_spent, 20_850.0);
    assert!((summary.savings_rate - 0.722).abs() < 1e-3);
    assert_eq!(summary.category(Category::Food).budget, 11_250.0);
}

#[test]
fn spending_categories_sum_to_total_spent() {
    let ledger = varied_ledger();
    for income in [1.0, 40_000.0, 75_000.0, 250_000.0] {
        let summary = SummaryService::compute(&ledger, income, &household_allocation(), feb_period());
        let spending: f64 = Category::spending()
            .map(|category| summary.category(category).spent)
            .sum();
        assert!((spending - summary.total_spent).abs() < 1e-9);
        assert_eq!(summary.category(Category::Savings).spent, 5_000.0);
    }
}

#[test]
fn compute_is_idempotent() {
    let ledger = varied_ledger();
    let allocation = household_allocation();
    let first = SummaryService::compute(&ledger, 75_000.0, &allocation, feb_period());
    let second = SummaryService::compute(&ledger, 75_000.0, &allocation, feb_period());
    assert_eq!(first, second);
}

#[test]
fn category_filter_matches_breakdown() {
    let ledger = varied_ledger();
    let summary = SummaryService::compute(&ledger, 75_000.0, &household_allocation(), feb_period());
    for category in Category::ALL {
        let filtered = SummaryService::category_spent(&ledger, category, feb_period());
        assert_eq!(filtered, summary.category(category).spent, "{category}");
    }
}

#[test]
fn add_then_remove_restores_ledger() {
    let mut ledger = varied_ledger();
    let before = ledger.clone();
    let extra = txn(99.0, Category::Shopping, 14);
    let id = extra.id.clone();

    ledger.add(extra);
    assert_eq!(ledger.len(), before.len() + 1);
    assert!(ledger.remove(&id).is_some());
    assert_eq!(ledger, before);
}

#[test]
fn zero_income_yields_zero_rates() {
    let ledger = varied_ledger();
    let summary = SummaryService::compute(&ledger, 0.0, &household_allocation(), feb_period());
    assert_eq!(summary.savings_rate, 0.0);
    assert!(summary
        .category_breakdown
        .values()
        .all(|spend| spend.percentage == 0.0 && spend.budget == 0.0));
}

#[test]
fn entries_outside_period_are_ignored() {
    let mut ledger = varied_ledger();
    let march = rl_budget_core::ledger::Transaction::new(
        10_000.0,
        Category::Food,
        "March feast",
        feb(28) + chrono::Duration::days(1),
        rl_budget_core::ledger::TransactionSource::Manual,
    );
    ledger.add(march);
    let summary = SummaryService::compute(&ledger, 75_000.0, &household_allocation(), feb_period());
    assert_eq!(summary.category(Category::Food).spent, 1_600.0);
}

#[test]
fn drifting_allocation_still_computes() {
    let ledger = varied_ledger();
    let lopsided = BudgetAllocation {
        food: 60.0,
        ..household_allocation()
    };
    let summary = SummaryService::compute(&ledger, 75_000.0, &lopsided, feb_period());
    assert_eq!(summary.category(Category::Food).budget, 45_000.0);
}

#[test]
fn sort_by_amount_is_a_view() {
    let ledger = varied_ledger();
    let order: Vec<f64> = ledger
        .sort(SortKey::Amount, true)
        .into_iter()
        .map(|entry| entry.amount)
        .collect();
    assert_eq!(order.first(), Some(&20_000.0));
    assert_eq!(order.last(), Some(&750.0));
    assert_eq!(ledger.iter().next().map(|entry| entry.amount), Some(750.0));
}
