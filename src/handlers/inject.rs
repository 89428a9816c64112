use crate::error::InjectorError;
use crate::router::InjectorState;
use crate::types::{InjectFailureResponse, InjectRequest, InjectResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

/// POST /inject-credential
pub async fn inject_credential(
    State(state): State<InjectorState>,
    payload: Result<Json<InjectRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return InjectorError::InvalidBody(rejection.body_text()).into_response(),
    };

    let (user_id, provider) = match req.required_fields() {
        Ok(fields) => fields,
        Err(e) => return e.into_response_with_attempt(req.attempt),
    };
    let attempt = req.attempt;

    info!(%user_id, %provider, ?attempt, "credential injection requested");

    // Detached so a client disconnect (which drops this future) cannot
    // interrupt the import, the scratch cleanup or the status write.
    let injector = state.injector.clone();
    let task = {
        let (user_id, provider) = (user_id.clone(), provider.clone());
        tokio::spawn(async move { injector.inject(&user_id, &provider).await })
    };
    let result = task.await.unwrap_or_else(|e| Err(InjectorError::from(e)));

    match result {
        Ok(outcome) if outcome.success => (
            StatusCode::OK,
            Json(InjectResponse {
                success: true,
                message: outcome.message,
                credential_id: outcome.credential_id,
                details: outcome.details,
                attempt,
            }),
        )
            .into_response(),
        Ok(outcome) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(InjectFailureResponse {
                success: false,
                error_type: "import_failed",
                message: outcome.message,
                attempt,
                troubleshooting: outcome.troubleshooting,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(%user_id, %provider, error = %e, error_type = e.error_type(), "credential injection aborted");
            e.into_response_with_attempt(attempt)
        }
    }
}
