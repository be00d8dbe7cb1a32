use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::Category;

/// Stable identity of a ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Generates a random session-unique token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a transaction record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    #[default]
    Manual,
    Imported,
    #[serde(other)]
    Auto,
}

/// A single spend record. Immutable once created; the ledger only ever adds or
/// removes whole entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "transactionId")]
    pub id: TransactionId,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "date", with = "calendar_date")]
    pub occurred_at: NaiveDate,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source: TransactionSource,
}

impl Transaction {
    pub fn new(
        amount: f64,
        category: Category,
        description: impl Into<String>,
        occurred_at: NaiveDate,
        source: TransactionSource,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            amount,
            category,
            description: description.into(),
            occurred_at,
            created_at: Utc::now(),
            source,
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Accepts either `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the date.
pub(crate) mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date `{}`", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        NaiveDate::parse_from_str(trimmed, FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(trimmed)
                    .ok()
                    .map(|stamp| stamp.date_naive())
            })
    }
}
