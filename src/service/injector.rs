use super::classifier::OutcomeClassifier;
use super::cli_probe::CliProbe;
use super::fetcher::fetch_injection_source;
use super::import_file::{ImportDocument, write_import_file};
use super::importer::{InjectionOutcome, SubprocessImporter};
use super::runner::CommandRunner;
use super::status::report_status;
use super::template::CredentialTemplate;
use crate::config::Config;
use crate::error::InjectorError;
use crate::store::CredentialStore;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Backend as resolved at startup. Only `Ready` can serve injections; the
/// other two fail each request with a configuration error.
#[derive(Clone)]
pub enum BackendStore {
    Ready(Arc<dyn CredentialStore>),
    Unconfigured,
    Invalid(String),
}

impl BackendStore {
    pub fn get(&self) -> Result<&dyn CredentialStore, InjectorError> {
        match self {
            BackendStore::Ready(store) => Ok(store.as_ref()),
            BackendStore::Unconfigured => Err(InjectorError::MissingBackendConfig),
            BackendStore::Invalid(reason) => {
                Err(InjectorError::InvalidBackendConfig(reason.clone()))
            }
        }
    }
}

impl From<Option<Arc<dyn CredentialStore>>> for BackendStore {
    fn from(store: Option<Arc<dyn CredentialStore>>) -> Self {
        store.map_or(BackendStore::Unconfigured, BackendStore::Ready)
    }
}

/// Fetch, build, write, import, report. One call per HTTP request.
pub struct CredentialInjector {
    store: BackendStore,
    probe: CliProbe,
    importer: SubprocessImporter,
    scratch_dir: PathBuf,
    default_encryption_key: Option<String>,
}

impl CredentialInjector {
    pub fn new(
        cfg: &Config,
        store: impl Into<BackendStore>,
        runner: Arc<dyn CommandRunner>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> Self {
        Self {
            store: store.into(),
            probe: CliProbe::new(cfg, runner.clone()),
            importer: SubprocessImporter::new(cfg, runner, classifier),
            scratch_dir: cfg.scratch_dir.clone(),
            default_encryption_key: cfg.n8n_encryption_key.clone(),
        }
    }

    pub fn probe(&self) -> &CliProbe {
        &self.probe
    }

    pub async fn inject(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<InjectionOutcome, InjectorError> {
        let store = self.store.get()?;

        let version = self.probe.version().await.inspect_err(|e| {
            warn!(user_id, provider, error = %e, "n8n CLI pre-flight failed");
        })?;
        info!(user_id, provider, n8n_version = %version, "starting credential injection");

        let source = fetch_injection_source(store, user_id, provider).await?;
        let encryption_key = source
            .encryption_key(self.default_encryption_key.as_deref())
            .ok_or_else(|| InjectorError::MissingEncryptionKey(user_id.to_string()))?
            .to_string();

        let template = CredentialTemplate::build(&source, Utc::now())?;
        let scratch =
            write_import_file(&self.scratch_dir, &ImportDocument::new(vec![template.clone()]))
                .await?;

        let outcome = self
            .importer
            .import(scratch.path(), &encryption_key, &template.id)
            .await;
        scratch.remove().await;

        if !outcome.success {
            warn!(user_id, provider, message = %outcome.message, "credential injection failed");
        }
        report_status(store, user_id, provider, &outcome).await?;
        Ok(outcome)
    }
}
