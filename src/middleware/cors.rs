use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::CorsLayer;

/// Any origin, method and header.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Answer every `OPTIONS` request with 200 before routing.
pub async fn options_short_circuit(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}
