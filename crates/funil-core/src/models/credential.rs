use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// A third-party integration secret (payment gateway, UTM tracker, data
/// provider). Key material arrives already masked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub name: String,
    #[serde(rename = "credential_type", alias = "service", alias = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Ativa"
        } else {
            "Inativa"
        }
    }

    /// Last update as dd/mm/yyyy, or "-" when unknown
    pub fn updated_display(&self) -> String {
        self.updated_at
            .map(|dt| dt.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Body for credential create/update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CredentialInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
