//! Bearer credentials for the budget service.

/// Token presented on every service call.
pub const FIXTURE_TOKEN: &str = "mock-dev-token";

/// Supplies the bearer token attached to outgoing requests.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> String;

    /// True when the token is the deterministic development credential.
    fn is_fixture(&self) -> bool {
        false
    }
}

/// A token taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> String {
        self.token.clone()
    }
}

/// Stand-in used when no identity provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCredentials;

impl CredentialProvider for FixtureCredentials {
    fn bearer_token(&self) -> String {
        FIXTURE_TOKEN.to_string()
    }

    fn is_fixture(&self) -> bool {
        true
    }
}
