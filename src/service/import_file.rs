use super::template::CredentialTemplate;
use crate::error::InjectorError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub const IMPORT_DOCUMENT_VERSION: &str = "1.0";

/// Envelope handed to `n8n import:credentials`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportDocument {
    pub version: String,
    pub credentials: Vec<CredentialTemplate>,
    pub workflows: Vec<Value>,
}

impl ImportDocument {
    pub fn new(credentials: Vec<CredentialTemplate>) -> Self {
        Self {
            version: IMPORT_DOCUMENT_VERSION.to_string(),
            credentials,
            workflows: Vec::new(),
        }
    }
}

/// An import document on local disk, consumed once by the importer.
///
/// Removed by [`ScratchFile::remove`]; if the owner is dropped first (a
/// cancelled task, an early error) `Drop` removes it instead.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    removed: bool,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advisory cleanup. Failures are logged and never escalated.
    pub async fn remove(mut self) {
        let result = tokio::fs::remove_file(&self.path).await;
        self.removed = true;
        log_removal(&self.path, result);
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.removed {
            log_removal(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "scratch file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "scratch file already gone")
        }
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to remove scratch file"
        ),
    }
}

/// Scratch name: millisecond timestamp plus a random suffix, so two
/// requests landing in the same millisecond still get distinct files.
fn scratch_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "n8n-credentials-{}-{}.json",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// Serialize `doc` into a new file under `dir`.
pub async fn write_import_file(
    dir: &Path,
    doc: &ImportDocument,
) -> Result<ScratchFile, InjectorError> {
    tokio::fs::create_dir_all(dir).await?;
    let bytes = serde_json::to_vec_pretty(doc)?;
    let scratch = persist(ScratchFile::new(dir.join(scratch_name())), bytes).await?;
    debug!(path = %scratch.path().display(), credentials = doc.credentials.len(), "import file written");
    Ok(scratch)
}

async fn persist(scratch: ScratchFile, bytes: Vec<u8>) -> Result<ScratchFile, InjectorError> {
    if let Err(e) = tokio::fs::write(scratch.path(), bytes).await {
        // A failed write may still leave a truncated file behind.
        scratch.remove().await;
        return Err(e.into());
    }
    Ok(scratch)
}
