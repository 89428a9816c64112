use crate::handlers::{health, inject};
use crate::middleware::cors::{options_short_circuit, permissive_cors};
use crate::service::CredentialInjector;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct InjectorState {
    pub injector: Arc<CredentialInjector>,
}

impl InjectorState {
    pub fn new(injector: CredentialInjector) -> Self {
        Self {
            injector: Arc::new(injector),
        }
    }
}

pub fn injector_router(state: InjectorState) -> Router {
    Router::new()
        .route("/", get(health::root_status))
        .route("/health", get(health::health))
        .route("/inject-credential", post(inject::inject_credential))
        .layer(middleware::from_fn(options_short_circuit))
        .layer(permissive_cors())
        .with_state(state)
}
