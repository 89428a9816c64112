use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum InjectorError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Supabase configuration missing (SUPABASE_URL / SUPABASE_SERVICE_KEY)")]
    MissingBackendConfig,

    #[error("Invalid backend configuration: {0}")]
    InvalidBackendConfig(String),

    #[error("No n8n encryption key available for user {0}")]
    MissingEncryptionKey(String),

    #[error("n8n CLI unavailable: {0}")]
    CliUnavailable(String),

    #[error("No stored credential found for user {user_id} and provider {provider}")]
    CredentialNotFound { user_id: String, provider: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("HTTP request error: {0}")]
    Backend(#[from] reqwest::Error),

    #[error("Backend responded with status: {0}")]
    BackendStatus(StatusCode),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Failed to record injection status: {source}")]
    StatusWrite {
        credential_id: Option<String>,
        #[source]
        source: Box<InjectorError>,
    },

    #[error("Command timed out after {0:?}")]
    CommandTimeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Injection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl InjectorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InjectorError::MissingField(_)
            | InjectorError::InvalidBody(_)
            | InjectorError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            InjectorError::CredentialNotFound { .. } => StatusCode::NOT_FOUND,
            InjectorError::Backend(_)
            | InjectorError::BackendStatus(_)
            | InjectorError::UrlParse(_) => StatusCode::BAD_GATEWAY,
            InjectorError::MissingBackendConfig
            | InjectorError::InvalidBackendConfig(_)
            | InjectorError::MissingEncryptionKey(_)
            | InjectorError::CliUnavailable(_)
            | InjectorError::StatusWrite { .. }
            | InjectorError::CommandTimeout(_)
            | InjectorError::Io(_)
            | InjectorError::Json(_)
            | InjectorError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Coarse machine-readable category echoed to clients as `error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            InjectorError::MissingField(_) | InjectorError::InvalidBody(_) => "validation_error",
            InjectorError::MissingBackendConfig
            | InjectorError::InvalidBackendConfig(_)
            | InjectorError::MissingEncryptionKey(_) => "config_error",
            InjectorError::CliUnavailable(_) => "cli_unavailable",
            InjectorError::CredentialNotFound { .. } => "not_found",
            InjectorError::UnsupportedProvider(_) => "unsupported_provider",
            InjectorError::Backend(_)
            | InjectorError::BackendStatus(_)
            | InjectorError::UrlParse(_) => "backend_error",
            InjectorError::StatusWrite { .. } => "status_write_failed",
            InjectorError::CommandTimeout(_)
            | InjectorError::Io(_)
            | InjectorError::Json(_)
            | InjectorError::Task(_) => "internal_error",
        }
    }

    /// Render the error, echoing the caller's `attempt` value when present.
    pub fn into_response_with_attempt(self, attempt: Option<Value>) -> axum::response::Response {
        let status = self.status_code();
        let credential_id = match &self {
            InjectorError::StatusWrite { credential_id, .. } => credential_id.clone(),
            _ => None,
        };
        let body = ApiErrorResponse {
            success: false,
            error_type: self.error_type(),
            message: self.to_string(),
            attempt,
            credential_id,
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for InjectorError {
    fn into_response(self) -> axum::response::Response {
        self.into_response_with_attempt(None)
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}
