use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, Url,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    errors::{BudgetError, Result},
    ledger::{
        BudgetHistoryEntry, Decision, ModelType, Period, PeriodSummary, ProfileUpdate,
        Transaction, TransactionId, TransactionQuery, UserProfile,
    },
};

use super::{
    BudgetApi, CreatedTransaction, CredentialProvider, FeedbackRequest, HistoryResponse,
    SuggestionEnvelope, SuggestionRequest, TransactionPage,
};

/// REST client for the budget service. No retries and no timeouts beyond
/// reqwest's defaults; failures are left to the caller's fallback.
#[derive(Clone)]
pub struct HttpBudgetApi {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpBudgetApi {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|err| BudgetError::Config(format!("invalid API base URL `{}`: {}", base_url, err)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| BudgetError::Config(format!("failed to build HTTP client: {}", err)))?;

        debug!(
            base_url = %base_url,
            fixture_credentials = credentials.is_fixture(),
            "budget API client ready"
        );
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| BudgetError::Config(format!("invalid endpoint `{}`: {}", path, err)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.credentials.bearer_token())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorized(request).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.authorized(request).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl BudgetApi for HttpBudgetApi {
    async fn summary(&self, _period: Period) -> Result<PeriodSummary> {
        let url = self.endpoint("api/summary/current")?;
        debug!(%url, "fetching summary");
        self.send_json(self.http.get(url)).await
    }

    async fn suggestion(&self, model_type: ModelType, _period: Period) -> Result<SuggestionEnvelope> {
        let url = self.endpoint("api/rl/suggest")?;
        let body = SuggestionRequest {
            model_type,
            period: "next".into(),
        };
        debug!(%url, %model_type, "requesting suggestion");
        self.send_json(self.http.post(url).json(&body)).await
    }

    async fn feedback(&self, budget_id: &str, decision: Decision) -> Result<()> {
        let url = self.endpoint("api/rl/feedback")?;
        let body = FeedbackRequest {
            budget_id: budget_id.to_string(),
            action: decision,
        };
        self.send_empty(self.http.post(url).json(&body)).await
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let url = self.endpoint("api/transactions")?;
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(category) = query.category {
            params.push(("category", category.key().to_string()));
        }
        if let Some(period) = query.period {
            params.push(("period", period.start.format("%Y-%m").to_string()));
        }
        self.send_json(self.http.get(url).query(&params)).await
    }

    async fn create_transaction(&self, transaction: &Transaction) -> Result<TransactionId> {
        let url = self.endpoint("api/transactions")?;
        let created: CreatedTransaction = self.send_json(self.http.post(url).json(transaction)).await?;
        Ok(created.transaction_id)
    }

    async fn delete_transaction(&self, id: &TransactionId) -> Result<()> {
        let url = self.endpoint(&format!("api/transactions/{}", id))?;
        self.send_empty(self.http.delete(url)).await
    }

    async fn import_transactions(&self, csv: &str) -> Result<Vec<Transaction>> {
        let url = self.endpoint("api/transactions/import")?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/csv")
            .body(csv.to_string());
        let page: TransactionPage = self.send_json(request).await?;
        Ok(page.transactions)
    }

    async fn history(&self, months: u32) -> Result<Vec<BudgetHistoryEntry>> {
        let url = self.endpoint("api/budgets/history")?;
        let response: HistoryResponse = self
            .send_json(self.http.get(url).query(&[("months", months)]))
            .await?;
        Ok(response.budgets)
    }

    async fn profile(&self) -> Result<UserProfile> {
        let url = self.endpoint("api/users/profile")?;
        self.send_json(self.http.get(url)).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        let url = self.endpoint("api/users/profile")?;
        debug!(%url, "updating profile");
        self.send_empty(self.http.put(url).json(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FixtureCredentials;

    #[test]
    fn endpoints_resolve_under_base_path() {
        let api = HttpBudgetApi::new("http://localhost:8000/v1", Arc::new(FixtureCredentials)).unwrap();
        assert_eq!(
            api.endpoint("api/summary/current").unwrap().as_str(),
            "http://localhost:8000/v1/api/summary/current"
        );
    }

    #[test]
    fn rejects_malformed_base_url() {
        let result = HttpBudgetApi::new("::nope::", Arc::new(FixtureCredentials));
        assert!(matches!(result, Err(BudgetError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_recoverable() {
        let api = HttpBudgetApi::new("http://127.0.0.1:9", Arc::new(FixtureCredentials)).unwrap();
        let err = api.profile().await.expect_err("nothing listens on port 9");
        assert!(err.is_recoverable(), "{err}");
    }
}
