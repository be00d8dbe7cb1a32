use serde::{Deserialize, Serialize};

/// How aggressively the user wants suggestions to move money around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskPreference {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

/// Account holder as reported by the profile endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub monthly_income: f64,
    #[serde(default = "UserProfile::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub risk_preference: RiskPreference,
    #[serde(default)]
    pub onboarding_complete: bool,
}

impl UserProfile {
    pub fn default_currency() -> String {
        "INR".into()
    }
}

/// Partial profile edit sent to the profile endpoint. Unset fields are left alone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_preference: Option<RiskPreference>,
}

impl ProfileUpdate {
    pub fn income(monthly_income: f64) -> Self {
        Self {
            monthly_income: Some(monthly_income),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(income) = self.monthly_income {
            profile.monthly_income = income;
        }
        if let Some(risk) = self.risk_preference {
            profile.risk_preference = risk;
        }
    }
}
