use super::importer::IMPORT_SUBCOMMAND;
use super::runner::{CommandRunner, CommandSpec};
use crate::config::Config;
use crate::error::InjectorError;
use std::sync::Arc;
use std::time::Duration;

/// Short-lived checks that the n8n CLI is installed and usable.
pub struct CliProbe {
    runner: Arc<dyn CommandRunner>,
    n8n_bin: String,
    timeout: Duration,
}

impl CliProbe {
    pub fn new(cfg: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            n8n_bin: cfg.n8n_bin.clone(),
            timeout: cfg.probe_timeout(),
        }
    }

    /// `n8n --version`. Any failure is reported as `CliUnavailable`.
    pub async fn version(&self) -> Result<String, InjectorError> {
        let spec = CommandSpec::new(&self.n8n_bin, self.timeout).arg("--version");
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| InjectorError::CliUnavailable(e.to_string()))?;

        let version = output.stdout.trim();
        if !output.succeeded() || version.is_empty() {
            return Err(InjectorError::CliUnavailable(format!(
                "`{} --version` exited with {:?}: {}",
                self.n8n_bin,
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(version.to_string())
    }

    /// `n8n --help` must list the import subcommand.
    pub async fn check_import_command(&self) -> Result<(), InjectorError> {
        let spec = CommandSpec::new(&self.n8n_bin, self.timeout).arg("--help");
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| InjectorError::CliUnavailable(e.to_string()))?;

        if output.combined().contains(IMPORT_SUBCOMMAND) {
            Ok(())
        } else {
            Err(InjectorError::CliUnavailable(format!(
                "`{} --help` does not list {IMPORT_SUBCOMMAND}",
                self.n8n_bin
            )))
        }
    }
}
