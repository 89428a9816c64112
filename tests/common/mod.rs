#![allow(dead_code)]

use async_trait::async_trait;
use n8n_injector::config::Config;
use n8n_injector::error::InjectorError;
use n8n_injector::router::{InjectorState, injector_router};
use n8n_injector::service::{
    BackendStore, CommandOutput, CommandRunner, CommandSpec, CredentialInjector, MarkerClassifier,
};
use n8n_injector::store::{CredentialRecord, CredentialStore, InjectionStatusUpdate, UserConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory store that records every status write.
#[derive(Default)]
pub struct FakeStore {
    pub credentials: Mutex<HashMap<(String, String), CredentialRecord>>,
    pub configs: Mutex<HashMap<String, UserConfig>>,
    pub updates: Mutex<Vec<(String, String, InjectionStatusUpdate)>>,
    pub fail_updates: bool,
    pub fail_lookups: bool,
}

impl FakeStore {
    pub fn with_user(user_id: &str, provider: &str) -> Self {
        let store = FakeStore::default();
        store.credentials.lock().unwrap().insert(
            (user_id.to_string(), provider.to_string()),
            CredentialRecord {
                user_id: user_id.to_string(),
                provider: provider.to_string(),
                access_token: "ya29.access".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
            },
        );
        store.configs.lock().unwrap().insert(
            user_id.to_string(),
            UserConfig {
                user_id: user_id.to_string(),
                n8n_url: Some("https://n8n.example.com".to_string()),
                n8n_email: Some("owner@example.com".to_string()),
                n8n_encryption_key: Some("user-key".to_string()),
            },
        );
        store
    }

    /// Credential row present, user config row missing.
    pub fn without_config(user_id: &str, provider: &str) -> Self {
        let store = FakeStore::with_user(user_id, provider);
        store.configs.lock().unwrap().clear();
        store
    }

    pub fn updates(&self) -> Vec<(String, String, InjectionStatusUpdate)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for FakeStore {
    async fn find_credential(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, InjectorError> {
        if self.fail_lookups {
            return Err(InjectorError::BackendStatus(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), provider.to_string()))
            .cloned())
    }

    async fn find_user_config(&self, user_id: &str) -> Result<Option<UserConfig>, InjectorError> {
        if self.fail_lookups {
            return Err(InjectorError::BackendStatus(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(self.configs.lock().unwrap().get(user_id).cloned())
    }

    async fn update_injection_status(
        &self,
        user_id: &str,
        provider: &str,
        update: &InjectionStatusUpdate,
    ) -> Result<(), InjectorError> {
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), provider.to_string(), update.clone()));
        if self.fail_updates {
            return Err(InjectorError::BackendStatus(
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(())
    }
}

/// Stand-in for the n8n binary. Import replies are keyed by strategy name.
pub struct FakeCli {
    pub available: bool,
    pub import_replies: HashMap<&'static str, CommandOutput>,
    pub calls: Mutex<Vec<CommandSpec>>,
    /// How long each import call takes before replying.
    pub import_delay: Duration,
}

impl FakeCli {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            import_replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            import_delay: Duration::ZERO,
        }
    }

    pub fn slow_imports(mut self, delay: Duration) -> Self {
        self.import_delay = delay;
        self
    }

    pub fn reply(mut self, strategy: &'static str, code: i32, stdout: &str) -> Self {
        self.import_replies.insert(
            strategy,
            CommandOutput {
                exit_code: Some(code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn import_calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("import:credentials"))
            .cloned()
            .collect()
    }

    fn strategy_of(spec: &CommandSpec) -> &'static str {
        if !spec.inherit_env {
            "minimal"
        } else if spec.args.iter().any(|a| a.starts_with("--userFolder")) {
            "userFolder"
        } else {
            "basic"
        }
    }
}

#[async_trait]
impl CommandRunner for FakeCli {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, InjectorError> {
        self.calls.lock().unwrap().push(spec.clone());
        if !self.available {
            return Err(InjectorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "n8n: command not found",
            )));
        }

        let first = spec.args.first().map(String::as_str);
        let output = match first {
            Some("--version") => CommandOutput {
                exit_code: Some(0),
                stdout: "1.64.0\n".to_string(),
                stderr: String::new(),
            },
            Some("--help") => CommandOutput {
                exit_code: Some(0),
                stdout: "Commands:\n  import:credentials  Import credentials\n  start".to_string(),
                stderr: String::new(),
            },
            _ => {
                // The import file must exist while the importer runs.
                let input = spec
                    .args
                    .iter()
                    .find_map(|a| a.strip_prefix("--input="))
                    .expect("import call carries --input");
                assert!(Path::new(input).exists(), "scratch file missing during import");
                if !self.import_delay.is_zero() {
                    tokio::time::sleep(self.import_delay).await;
                }

                self.import_replies
                    .get(Self::strategy_of(spec))
                    .cloned()
                    .unwrap_or(CommandOutput {
                        exit_code: Some(1),
                        stdout: "Error: unable to import".to_string(),
                        stderr: String::new(),
                    })
            }
        };
        Ok(output)
    }
}

pub struct Harness {
    pub app: axum::Router,
    pub store: Arc<FakeStore>,
    pub cli: Arc<FakeCli>,
    pub scratch: tempfile::TempDir,
}

pub fn harness(store: Option<FakeStore>, cli: FakeCli) -> Harness {
    let backend_configured = store.is_some();
    let store = Arc::new(store.unwrap_or_default());
    let backend = if backend_configured {
        BackendStore::Ready(store.clone())
    } else {
        BackendStore::Unconfigured
    };
    build_harness(store, backend, cli)
}

/// Harness whose backend settings were rejected at startup.
pub fn harness_with_invalid_backend(reason: &str, cli: FakeCli) -> Harness {
    build_harness(
        Arc::new(FakeStore::default()),
        BackendStore::Invalid(reason.to_string()),
        cli,
    )
}

fn build_harness(store: Arc<FakeStore>, backend: BackendStore, cli: FakeCli) -> Harness {
    let scratch = tempfile::tempdir().expect("scratch tempdir");
    let mut cfg = Config::default();
    cfg.scratch_dir = scratch.path().join("imports");
    cfg.n8n_user_folder = scratch.path().join("user-folder");

    let cli = Arc::new(cli);
    let injector = CredentialInjector::new(
        &cfg,
        backend,
        cli.clone(),
        Arc::new(MarkerClassifier::new(cfg.success_markers.clone())),
    );
    let app = injector_router(InjectorState::new(injector));

    Harness {
        app,
        store,
        cli,
        scratch,
    }
}

impl Harness {
    /// Files left behind in the scratch import directory.
    pub fn leftover_imports(&self) -> usize {
        std::fs::read_dir(self.scratch.path().join("imports"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
