use mimalloc::MiMalloc;
use n8n_injector::config::Config;
use n8n_injector::error::InjectorError;
use n8n_injector::service::{
    BackendStore, CommandRunner, CredentialInjector, MarkerClassifier, OutcomeClassifier,
    TokioCommandRunner,
};
use n8n_injector::store::SupabaseStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Arc::new(Config::from_env()?);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        supabase_url = %cfg.supabase_url.as_deref().unwrap_or("<none>"),
        supabase_service_key = if cfg.supabase_service_key.is_some() { "<set>" } else { "<none>" },
        n8n_bin = %cfg.n8n_bin,
        n8n_encryption_key = if cfg.n8n_encryption_key.is_some() { "<set>" } else { "<none>" },
        scratch_dir = %cfg.scratch_dir.display(),
        loglevel = %cfg.loglevel,
    );

    let store = match SupabaseStore::from_config(&cfg) {
        Ok(Some(store)) => BackendStore::Ready(Arc::new(store)),
        Ok(None) => {
            warn!("SUPABASE_URL / SUPABASE_SERVICE_KEY not set; injections will be rejected");
            BackendStore::Unconfigured
        }
        Err(e) => {
            error!(error = %e, "backend configuration is invalid; injections will be rejected");
            BackendStore::Invalid(match e {
                InjectorError::InvalidBackendConfig(reason) => reason,
                other => other.to_string(),
            })
        }
    };

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::default());
    let classifier: Arc<dyn OutcomeClassifier> =
        Arc::new(MarkerClassifier::new(cfg.success_markers.clone()));
    let injector = CredentialInjector::new(&cfg, store, runner, classifier);

    let state = n8n_injector::router::InjectorState::new(injector);
    let app = n8n_injector::router::injector_router(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
