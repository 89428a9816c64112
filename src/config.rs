use crate::error::InjectorError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment keys read at startup. Anything else in the process
/// environment is ignored.
const ENV_KEYS: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_SERVICE_KEY",
    "PORT",
    "LOGLEVEL",
    "N8N_BIN",
    "N8N_ENCRYPTION_KEY",
    "N8N_USER_FOLDER",
    "SCRATCH_DIR",
    "IMPORT_TIMEOUT_SECS",
    "PROBE_TIMEOUT_SECS",
    "SUCCESS_MARKERS",
    "CREDENTIALS_TABLE",
    "USER_CONFIG_TABLE",
];

/// Immutable runtime configuration, built once in `main` and shared by `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kept raw so a malformed value surfaces per request, not at startup.
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub port: u16,
    pub loglevel: String,

    pub n8n_bin: String,
    pub n8n_encryption_key: Option<String>,
    pub n8n_user_folder: PathBuf,
    pub scratch_dir: PathBuf,
    pub import_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub success_markers: Vec<String>,

    pub credentials_table: String,
    pub user_config_table: String,
}

impl Default for Config {
    fn default() -> Self {
        let scratch = std::env::temp_dir().join("n8n-injector");
        Self {
            supabase_url: None,
            supabase_service_key: None,
            port: 3000,
            loglevel: "info".to_string(),
            n8n_bin: "n8n".to_string(),
            n8n_encryption_key: None,
            n8n_user_folder: scratch.join("user-folder"),
            scratch_dir: scratch,
            import_timeout_secs: 60,
            probe_timeout_secs: 5,
            success_markers: vec![
                "Successfully imported".to_string(),
                "imported".to_string(),
                "credential".to_string(),
            ],
            credentials_table: "oauth_credentials".to_string(),
            user_config_table: "user_configs".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the recognised environment variables.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }

    /// Backend URL and service key. `Ok(None)` when either is unset or
    /// blank; `Err` when the URL is present but malformed.
    pub fn backend(&self) -> Result<Option<(Url, &str)>, InjectorError> {
        let url = self
            .supabase_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let key = self
            .supabase_service_key
            .as_deref()
            .filter(|k| !k.trim().is_empty());
        let (Some(url), Some(key)) = (url, key) else {
            return Ok(None);
        };
        let url = Url::parse(url)
            .map_err(|e| InjectorError::InvalidBackendConfig(format!("SUPABASE_URL: {e}")))?;
        Ok(Some((url, key)))
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.import_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.probe_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.success_markers.len(), 3);
        assert!(cfg.backend().expect("no error").is_none());
    }

    #[test]
    fn backend_requires_both_url_and_key() {
        let mut cfg = Config::default();
        cfg.supabase_url = Some("https://db.example.com".to_string());
        assert!(cfg.backend().expect("no error").is_none());

        cfg.supabase_service_key = Some("   ".to_string());
        assert!(cfg.backend().expect("no error").is_none());

        cfg.supabase_service_key = Some("service-key".to_string());
        let (url, key) = cfg
            .backend()
            .expect("no error")
            .expect("backend configured");
        assert_eq!(url.host_str(), Some("db.example.com"));
        assert_eq!(key, "service-key");
    }

    #[test]
    fn malformed_backend_url_is_a_config_error() {
        let mut cfg = Config::default();
        cfg.supabase_url = Some("not a url".to_string());
        cfg.supabase_service_key = Some("service-key".to_string());
        let err = cfg.backend().expect_err("malformed url");
        assert!(matches!(err, InjectorError::InvalidBackendConfig(_)));
        assert_eq!(err.error_type(), "config_error");
    }

    #[test]
    fn malformed_url_in_env_does_not_block_startup() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SUPABASE_URL", "::not-a-url::");
            let cfg = Config::from_env()?;
            assert_eq!(cfg.supabase_url.as_deref(), Some("::not-a-url::"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PORT", "8080");
            jail.set_env("SUPABASE_URL", "https://db.example.com");
            jail.set_env("SUPABASE_SERVICE_KEY", "k");
            jail.set_env("SUCCESS_MARKERS", "[done, ok]");
            jail.set_env("N8N_BIN", "n8n-custom");
            let cfg = Config::from_env()?;
            assert_eq!(cfg.port, 8080);
            assert_eq!(cfg.n8n_bin, "n8n-custom");
            assert!(matches!(cfg.backend(), Ok(Some(_))));
            assert_eq!(cfg.success_markers, vec!["done".to_string(), "ok".to_string()]);
            Ok(())
        });
    }
}
