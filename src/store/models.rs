use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored OAuth credential row, keyed by `(user_id, provider)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialRecord {
    pub user_id: String,
    pub provider: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// Per-user n8n settings. Read-only from this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    pub user_id: String,
    #[serde(default)]
    pub n8n_url: Option<String>,
    #[serde(default)]
    pub n8n_email: Option<String>,
    #[serde(default)]
    pub n8n_encryption_key: Option<String>,
}

/// Patch written back to the credential row after an import attempt.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InjectionStatusUpdate {
    pub injected_to_n8n: bool,
    pub injected_at: Option<DateTime<Utc>>,
    pub n8n_credential_id: Option<String>,
    pub injection_error: Option<String>,
    pub injection_details: Value,
    pub updated_at: DateTime<Utc>,
}
