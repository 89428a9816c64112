use crate::error::InjectorError;
use crate::store::{CredentialRecord, CredentialStore, UserConfig};
use tracing::{error, warn};

/// Stored credential merged with the owning user's n8n settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionSource {
    pub credential: CredentialRecord,
    pub config: UserConfig,
}

impl InjectionSource {
    /// Per-user encryption key, falling back to the process-wide one.
    pub fn encryption_key<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.config
            .n8n_encryption_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .or(fallback.filter(|k| !k.is_empty()))
    }
}

/// Look up the credential row and the user config row. Both must exist.
pub async fn fetch_injection_source(
    store: &dyn CredentialStore,
    user_id: &str,
    provider: &str,
) -> Result<InjectionSource, InjectorError> {
    let (credential, config) = tokio::try_join!(
        store.find_credential(user_id, provider),
        store.find_user_config(user_id),
    )
    .inspect_err(|e| {
        error!(user_id, provider, error = %e, "credential lookup failed");
    })?;

    match (credential, config) {
        (Some(credential), Some(config)) => Ok(InjectionSource { credential, config }),
        (credential, config) => {
            warn!(
                user_id,
                provider,
                credential_found = credential.is_some(),
                config_found = config.is_some(),
                "credential or user config missing"
            );
            Err(InjectorError::CredentialNotFound {
                user_id: user_id.to_string(),
                provider: provider.to_string(),
            })
        }
    }
}
