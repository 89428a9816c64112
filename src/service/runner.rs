use crate::error::InjectorError;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{MAIN_SEPARATOR, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// When false the child starts from an empty environment plus `env`.
    pub inherit_env: bool,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            inherit_env: true,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn clear_env(mut self) -> Self {
        self.inherit_env = false;
        self
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Captured result of a finished subprocess. Non-zero exits land here too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external commands. Spawn failures and timeouts are errors; a
/// process that ran to completion is always `Ok`, whatever its exit code.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, InjectorError>;
}

/// `tokio::process` backed runner.
///
/// A bare program name in a spec with a cleared environment is looked up
/// in this process's `PATH` (or `search_path`) first, since the child has
/// no `PATH` of its own to search.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    search_path: Option<OsString>,
}

impl TokioCommandRunner {
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    fn program_for(&self, spec: &CommandSpec) -> PathBuf {
        let program = PathBuf::from(&spec.program);
        if spec.inherit_env || spec.program.contains(MAIN_SEPARATOR) {
            return program;
        }
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match which::which_in(OsStr::new(&spec.program), search_path, cwd) {
            Ok(resolved) => {
                debug!(program = %spec.program, resolved = %resolved.display(), "resolved program for cleared environment");
                resolved
            }
            Err(e) => {
                debug!(program = %spec.program, error = %e, "program not found on PATH");
                program
            }
        }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, InjectorError> {
        let mut cmd = Command::new(self.program_for(spec));
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !spec.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(program = %spec.program, args = ?spec.args, "spawning command");
        let child = cmd.spawn()?;

        let output = timeout(spec.timeout, child.wait_with_output())
            .await
            .map_err(|_| InjectorError::CommandTimeout(spec.timeout))??;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
