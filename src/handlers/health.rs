use crate::router::InjectorState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::warn;

/// GET / -> liveness plus the installed n8n version.
pub async fn root_status(State(state): State<InjectorState>) -> impl IntoResponse {
    match state.injector.probe().version().await {
        Ok(version) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "n8n_cli": { "available": true, "version": version },
            })),
        ),
        Err(e) => {
            warn!(error = %e, "n8n version probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "service": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "n8n_cli": { "available": false, "error": e.to_string() },
                })),
            )
        }
    }
}

/// GET /health -> checks that `n8n --help` lists the import command.
pub async fn health(State(state): State<InjectorState>) -> impl IntoResponse {
    match state.injector.probe().check_import_command().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "n8n_cli": { "available": true, "import_command": true },
            })),
        ),
        Err(e) => {
            warn!(error = %e, "n8n help probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "n8n_cli": { "available": false, "import_command": false, "error": e.to_string() },
                })),
            )
        }
    }
}
