mod common;

use std::fs;

use common::{feb, setup_test_env};
use rl_budget_core::{
    client::fixture_dataset,
    config::{Config, ConfigManager, ServiceMode},
    ledger::{BudgetHistory, BudgetHistoryEntry, BudgetSource, ModelType, Period},
    utils::persistence::DatasetCache,
};
use tempfile::tempdir;

#[test]
fn config_round_trips_through_disk() {
    let (manager, _cache) = setup_test_env();
    assert_eq!(manager.load().unwrap(), Config::default());

    let config = Config {
        locale: "en-US".into(),
        currency: "USD".into(),
        service_mode: ServiceMode::Network,
        api_token: Some("token-123".into()),
        default_model_type: ModelType::QLearning,
        history_months: 12,
        ..Config::default()
    };
    manager.save(&config).unwrap();

    let reloaded = manager.load().unwrap();
    assert_eq!(reloaded, config);
    assert!(!manager.config_path().with_extension("json.tmp").exists());
}

#[test]
fn resolve_fills_cache_path() {
    let (manager, _cache) = setup_test_env();
    let resolved = manager.resolve().unwrap();
    assert_eq!(resolved.cache_path, Some(manager.default_cache_path()));
}

#[test]
fn corrupt_config_is_reported() {
    let (manager, _cache) = setup_test_env();
    fs::write(manager.config_path(), "{ not json").unwrap();
    assert!(manager.load().is_err());
}

#[test]
fn dataset_cache_survives_reload() {
    let temp = tempdir().unwrap();
    let cache = DatasetCache::new(temp.path().join("nested").join("cache.json"));
    assert!(cache.load().unwrap().is_none());

    let dataset = fixture_dataset();
    cache.save(&dataset).unwrap();
    let restored = cache.load().unwrap().expect("dataset present");
    assert!(restored.suggestion.is_none());
    assert_eq!(restored.profile, dataset.profile);
    assert_eq!(restored.transactions, dataset.transactions);
    assert_eq!(restored.period, dataset.period);
    assert_eq!(restored.history.len(), dataset.history.len());
}

#[test]
fn config_manager_creates_config_directory() {
    let temp = tempdir().unwrap();
    let manager = ConfigManager::with_base_dir(temp.path().join("home")).unwrap();
    assert!(manager.config_path().parent().unwrap().is_dir());
}

fn entry(month: u32) -> BudgetHistoryEntry {
    let period = Period::month_containing(chrono::NaiveDate::from_ymd_opt(2025, month, 1).unwrap());
    let mut template = fixture_dataset().history[0].clone();
    template.budget_id = format!("budget-2025-{month:02}");
    template.period_start = period.start;
    template.period_end = period.end;
    template.source = BudgetSource::Manual;
    template
}

#[test]
fn history_stays_ordered_and_bounded() {
    let mut history = BudgetHistory::with_capacity(3);
    for month in 1..=5 {
        history.append(entry(month)).unwrap();
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.entries()[0].budget_id, "budget-2025-03");
    assert!(history.append(entry(4)).is_err());
    assert_eq!(
        history.latest().map(|latest| latest.period_end),
        Some(chrono::NaiveDate::from_ymd_opt(2025, 5, 31).unwrap())
    );
    assert!(feb(1) > history.latest().unwrap().period_end);
}
