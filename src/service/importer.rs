use super::classifier::OutcomeClassifier;
use super::runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::InjectorError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const IMPORT_SUBCOMMAND: &str = "import:credentials";

/// Output kept in diagnostics, counted in characters from the end.
const OUTPUT_TAIL_CHARS: usize = 2000;

const SUGGESTED_FIXES: &[&str] = &[
    "Verify the n8n CLI is installed and on PATH for the service user",
    "Check that N8N_ENCRYPTION_KEY matches the key of the running n8n instance",
    "Ensure the n8n user folder exists and is writable",
    "Confirm the n8n version supports `import:credentials --input`",
    "Run the import manually with the same environment to inspect its output",
];

/// One fixed way of invoking the importer. Tried in `ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStrategy {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "userFolder")]
    UserFolder,
    #[serde(rename = "minimal")]
    Minimal,
}

impl ImportStrategy {
    pub const ALL: [ImportStrategy; 3] = [
        ImportStrategy::Basic,
        ImportStrategy::UserFolder,
        ImportStrategy::Minimal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ImportStrategy::Basic => "basic",
            ImportStrategy::UserFolder => "userFolder",
            ImportStrategy::Minimal => "minimal",
        }
    }

    /// Command line and environment for this strategy.
    pub fn command(
        self,
        n8n_bin: &str,
        input: &Path,
        encryption_key: &str,
        user_folder: &Path,
        timeout: Duration,
    ) -> CommandSpec {
        let base = CommandSpec::new(n8n_bin, timeout)
            .arg(IMPORT_SUBCOMMAND)
            .arg(format!("--input={}", input.display()));

        match self {
            ImportStrategy::Basic => base.env("N8N_ENCRYPTION_KEY", encryption_key),
            ImportStrategy::UserFolder => base
                .arg(format!("--userFolder={}", user_folder.display()))
                .env("N8N_ENCRYPTION_KEY", encryption_key)
                .env("N8N_USER_FOLDER", user_folder.display().to_string()),
            ImportStrategy::Minimal => base
                .clear_env()
                .env("NODE_ENV", "production")
                .env("N8N_ENCRYPTION_KEY", encryption_key)
                .env("N8N_LOG_LEVEL", "warn")
                .env("N8N_USER_MANAGEMENT_DISABLED", "true"),
        }
    }
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a single strategy did not count as a success.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StrategyFailure {
    pub strategy: ImportStrategy,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Static hints returned once every strategy has failed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Troubleshooting {
    pub strategies_tried: Vec<&'static str>,
    pub failures: Vec<StrategyFailure>,
    pub suggested_fixes: Vec<&'static str>,
}

/// Result of an injection attempt, shared by the status write and the
/// HTTP response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InjectionOutcome {
    pub success: bool,
    pub credential_id: Option<String>,
    pub message: String,
    pub details: Option<Value>,
    pub troubleshooting: Option<Troubleshooting>,
}

impl InjectionOutcome {
    fn succeeded(credential_id: &str, strategy: ImportStrategy, output: &CommandOutput) -> Self {
        Self {
            success: true,
            credential_id: Some(credential_id.to_string()),
            message: format!("Credential injected into n8n using the {strategy} strategy"),
            details: Some(json!({
                "strategy": strategy.name(),
                "exit_code": output.exit_code,
                "output": tail(&output.combined(), OUTPUT_TAIL_CHARS),
            })),
            troubleshooting: None,
        }
    }

    fn exhausted(failures: Vec<StrategyFailure>) -> Self {
        Self {
            success: false,
            credential_id: None,
            message: format!(
                "All {} import strategies failed",
                ImportStrategy::ALL.len()
            ),
            details: None,
            troubleshooting: Some(Troubleshooting {
                strategies_tried: failures.iter().map(|f| f.strategy.name()).collect(),
                failures,
                suggested_fixes: SUGGESTED_FIXES.to_vec(),
            }),
        }
    }

    /// Diagnostic blob persisted alongside the status flag.
    pub fn diagnostics(&self) -> Value {
        if let Some(details) = &self.details {
            return details.clone();
        }
        self.troubleshooting
            .as_ref()
            .and_then(|t| serde_json::to_value(t).ok())
            .unwrap_or(Value::Null)
    }
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}

/// Drives `n8n import:credentials` through the fixed strategy list.
pub struct SubprocessImporter {
    runner: Arc<dyn CommandRunner>,
    classifier: Arc<dyn OutcomeClassifier>,
    n8n_bin: String,
    user_folder: PathBuf,
    timeout: Duration,
}

impl SubprocessImporter {
    pub fn new(
        cfg: &Config,
        runner: Arc<dyn CommandRunner>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> Self {
        Self {
            runner,
            classifier,
            n8n_bin: cfg.n8n_bin.clone(),
            user_folder: cfg.n8n_user_folder.clone(),
            timeout: cfg.import_timeout(),
        }
    }

    /// Try each strategy in order until one is classified as a success.
    /// Never returns an error: every failure is folded into the outcome.
    pub async fn import(
        &self,
        input: &Path,
        encryption_key: &str,
        credential_id: &str,
    ) -> InjectionOutcome {
        let mut failures = Vec::with_capacity(ImportStrategy::ALL.len());

        for strategy in ImportStrategy::ALL {
            match self.attempt(strategy, input, encryption_key).await {
                Ok(output) if self.classifier.is_success(&output) => {
                    info!(%strategy, credential_id, exit_code = ?output.exit_code, "import succeeded");
                    return InjectionOutcome::succeeded(credential_id, strategy, &output);
                }
                Ok(output) => {
                    warn!(%strategy, exit_code = ?output.exit_code, "import output has no success marker");
                    failures.push(StrategyFailure {
                        strategy,
                        error: format!(
                            "no success marker in output (exit code {})",
                            output
                                .exit_code
                                .map_or_else(|| "none".to_string(), |c| c.to_string())
                        ),
                        output: Some(tail(&output.combined(), OUTPUT_TAIL_CHARS)),
                    });
                }
                Err(e) => {
                    warn!(%strategy, error = %e, "import strategy failed");
                    failures.push(StrategyFailure {
                        strategy,
                        error: e.to_string(),
                        output: None,
                    });
                }
            }
        }

        InjectionOutcome::exhausted(failures)
    }

    async fn attempt(
        &self,
        strategy: ImportStrategy,
        input: &Path,
        encryption_key: &str,
    ) -> Result<CommandOutput, InjectorError> {
        if strategy == ImportStrategy::UserFolder {
            tokio::fs::create_dir_all(&self.user_folder).await?;
        }
        let spec = strategy.command(
            &self.n8n_bin,
            input,
            encryption_key,
            &self.user_folder,
            self.timeout,
        );
        self.runner.run(&spec).await
    }
}
