use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    currency::{CurrencyCode, CurrencyFormatter},
    errors::{BudgetError, Result},
    ledger::{ModelType, DEFAULT_ALLOCATION_TOLERANCE, DEFAULT_HISTORY_CAPACITY},
    utils::persistence::write_file_atomic,
};

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const CACHE_FILE: &str = "dataset_cache.json";

/// Overrides the base directory holding config and cache files.
pub const ENV_HOME: &str = "RL_BUDGET_HOME";
pub const ENV_SERVICE_MODE: &str = "RL_BUDGET_SERVICE_MODE";
pub const ENV_API_BASE_URL: &str = "RL_BUDGET_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "RL_BUDGET_API_TOKEN";

/// Which budget service implementation to wire in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    #[default]
    Fixture,
    Network,
}

impl FromStr for ServiceMode {
    type Err = BudgetError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixture" | "mock" => Ok(ServiceMode::Fixture),
            "network" | "http" => Ok(ServiceMode::Network),
            other => Err(BudgetError::Config(format!("unknown service mode `{}`", other))),
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceMode::Fixture => "fixture",
            ServiceMode::Network => "network",
        };
        f.write_str(label)
    }
}

/// User-configurable preferences and service wiring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
    #[serde(default)]
    pub service_mode: ServiceMode,
    #[serde(default = "Config::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default)]
    pub default_model_type: ModelType,
    #[serde(default = "Config::default_history_months")]
    pub history_months: u32,
    #[serde(default = "Config::default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "Config::default_allocation_tolerance")]
    pub allocation_tolerance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Where the last-known dataset is cached. Defaults next to the config file.
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-IN".into(),
            currency: "INR".into(),
            currency_symbol: None,
            service_mode: ServiceMode::default(),
            api_base_url: Self::default_api_base_url(),
            api_token: None,
            default_model_type: ModelType::default(),
            history_months: Self::default_history_months(),
            history_capacity: Self::default_history_capacity(),
            allocation_tolerance: Self::default_allocation_tolerance(),
            cache_path: None,
        }
    }
}

impl Config {
    pub fn default_api_base_url() -> String {
        "http://localhost:8000".into()
    }

    pub fn default_history_months() -> u32 {
        6
    }

    pub fn default_history_capacity() -> usize {
        DEFAULT_HISTORY_CAPACITY
    }

    pub fn default_allocation_tolerance() -> f64 {
        DEFAULT_ALLOCATION_TOLERANCE
    }

    /// Formatter for `currency` in `locale`, honoring a custom symbol.
    pub fn currency_formatter(&self) -> CurrencyFormatter {
        let formatter = CurrencyFormatter::new(&CurrencyCode::new(self.currency.as_str()), &self.locale);
        match &self.currency_symbol {
            Some(symbol) => formatter.with_symbol(symbol.clone()),
            None => formatter,
        }
    }

    /// Applies `RL_BUDGET_*` environment variables on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_SERVICE_MODE) {
            self.service_mode = mode.parse()?;
        }
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|token| !token.trim().is_empty()) {
            self.api_token = Some(token.trim().to_string());
        }
        Ok(())
    }
}

/// Handles persistence of [`Config`] under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    base_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory, falling back to the home directory.
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rl_budget");
        Self::with_base_dir(base)
    }

    /// `RL_BUDGET_HOME` when set, the platform directory otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(ENV_HOME) {
            Some(home) if !home.is_empty() => Self::with_base_dir(PathBuf::from(home)),
            _ => Self::new(),
        }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        let config_dir = base.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;
        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            base_dir: base,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn default_cache_path(&self) -> PathBuf {
        self.base_dir.join(CACHE_FILE)
    }

    pub fn load(&self) -> Result<Config> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| BudgetError::Config(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| BudgetError::Config(err.to_string()))?;
        write_file_atomic(&self.config_path, &json)
    }

    /// Config file plus environment overrides, with the cache path resolved.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = self.load()?;
        config.apply_env_overrides()?;
        if config.cache_path.is_none() {
            config.cache_path = Some(self.default_cache_path());
        }
        Ok(config)
    }
}
