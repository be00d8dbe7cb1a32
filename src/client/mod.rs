//! The budget service seam.
//!
//! [`BudgetApi`] is the only way the session talks to the outside world. Two
//! implementations exist: [`FixtureBudgetApi`] serves a deterministic dataset
//! without I/O, and [`HttpBudgetApi`] calls the REST service. [`compose_api`]
//! picks one from configuration.

pub mod auth;
pub mod fixture;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::{Config, ServiceMode},
    core::services::SuggestionService,
    errors::{BudgetError, Result},
    ledger::{
        BudgetHistoryEntry, Decision, ModelType, Period, PeriodSummary, ProfileUpdate,
        RLSuggestion, SuggestionPayload, Transaction, TransactionId, TransactionQuery,
        UserProfile,
    },
};

pub use auth::{CredentialProvider, FixtureCredentials, StaticCredentials, FIXTURE_TOKEN};
pub use fixture::{fixture_dataset, fixture_period, FixtureBudgetApi};
pub use http::HttpBudgetApi;

/// Suggestion response as sent by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuggestionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub suggestion: Option<SuggestionPayload>,
}

impl SuggestionEnvelope {
    /// Validates the payload into a pending suggestion.
    pub fn into_suggestion(self) -> Result<RLSuggestion> {
        if !self.success {
            return Err(BudgetError::InvalidSuggestion(
                "service reported an unsuccessful suggestion".into(),
            ));
        }
        let payload = self
            .suggestion
            .ok_or_else(|| BudgetError::InvalidSuggestion("response carried no suggestion".into()))?;
        SuggestionService::from_payload(payload)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTransaction {
    #[serde(default)]
    pub success: bool,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    #[serde(default)]
    pub budgets: Vec<BudgetHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub budget_id: String,
    pub action: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub model_type: ModelType,
    pub period: String,
}

/// Async contract of the remote budget service.
#[async_trait]
pub trait BudgetApi: Send + Sync {
    async fn summary(&self, period: Period) -> Result<PeriodSummary>;
    async fn suggestion(&self, model_type: ModelType, period: Period) -> Result<SuggestionEnvelope>;
    async fn feedback(&self, budget_id: &str, decision: Decision) -> Result<()>;
    async fn transactions(&self, query: &TransactionQuery) -> Result<TransactionPage>;
    async fn create_transaction(&self, transaction: &Transaction) -> Result<TransactionId>;
    async fn delete_transaction(&self, id: &TransactionId) -> Result<()>;
    async fn import_transactions(&self, csv: &str) -> Result<Vec<Transaction>>;
    async fn history(&self, months: u32) -> Result<Vec<BudgetHistoryEntry>>;
    async fn profile(&self) -> Result<UserProfile>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()>;
}

/// Builds the service implementation selected by `config`.
///
/// Network mode without a token authenticates with [`FixtureCredentials`].
pub fn compose_api(config: &Config) -> Result<Arc<dyn BudgetApi>> {
    match config.service_mode {
        ServiceMode::Fixture => {
            info!("using fixture budget service");
            Ok(Arc::new(FixtureBudgetApi::new()))
        }
        ServiceMode::Network => {
            let credentials: Arc<dyn CredentialProvider> = match &config.api_token {
                Some(token) => Arc::new(StaticCredentials::new(token.clone())),
                None => {
                    warn!("no API token configured; using fixture credentials");
                    Arc::new(FixtureCredentials)
                }
            };
            info!(base_url = %config.api_base_url, "using network budget service");
            Ok(Arc::new(HttpBudgetApi::new(&config.api_base_url, credentials)?))
        }
    }
}
