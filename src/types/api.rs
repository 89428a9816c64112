use crate::error::InjectorError;
use crate::service::Troubleshooting;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /inject-credential`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjectRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    /// Opaque client value (usually a retry counter), echoed back untouched.
    #[serde(default)]
    pub attempt: Option<Value>,
}

impl InjectRequest {
    /// Required fields, trimmed. Blank strings count as missing.
    pub fn required_fields(&self) -> Result<(String, String), InjectorError> {
        let user_id = non_blank(self.user_id.as_deref()).ok_or(InjectorError::MissingField("user_id"))?;
        let provider =
            non_blank(self.provider.as_deref()).ok_or(InjectorError::MissingField("provider"))?;
        Ok((user_id.to_string(), provider.to_string()))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct InjectResponse {
    pub success: bool,
    pub message: String,
    pub credential_id: Option<String>,
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct InjectFailureResponse {
    pub success: bool,
    pub error_type: &'static str,
    pub message: String,
    pub attempt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troubleshooting: Option<Troubleshooting>,
}
