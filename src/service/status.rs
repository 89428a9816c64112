use super::importer::InjectionOutcome;
use crate::error::InjectorError;
use crate::store::{CredentialStore, InjectionStatusUpdate};
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Status patch describing `outcome` at time `now`.
pub fn status_update(outcome: &InjectionOutcome, now: DateTime<Utc>) -> InjectionStatusUpdate {
    InjectionStatusUpdate {
        injected_to_n8n: outcome.success,
        injected_at: outcome.success.then_some(now),
        n8n_credential_id: outcome.credential_id.clone(),
        injection_error: (!outcome.success).then(|| outcome.message.clone()),
        injection_details: outcome.diagnostics(),
        updated_at: now,
    }
}

/// Write the outcome back to the credential row. A failed write is fatal
/// for the request even when the import itself already took effect.
pub async fn report_status(
    store: &dyn CredentialStore,
    user_id: &str,
    provider: &str,
    outcome: &InjectionOutcome,
) -> Result<(), InjectorError> {
    let update = status_update(outcome, Utc::now());
    match store
        .update_injection_status(user_id, provider, &update)
        .await
    {
        Ok(()) => {
            info!(user_id, provider, injected = outcome.success, "injection status recorded");
            Ok(())
        }
        Err(e) => {
            error!(
                user_id,
                provider,
                credential_id = ?outcome.credential_id,
                imported = outcome.success,
                error = %e,
                "failed to record injection status"
            );
            Err(InjectorError::StatusWrite {
                credential_id: outcome.credential_id.clone(),
                source: Box::new(e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_sets_timestamp_and_clears_error() {
        let now = Utc::now();
        let outcome = InjectionOutcome {
            success: true,
            credential_id: Some("c1".into()),
            message: "ok".into(),
            details: Some(json!({"strategy": "basic"})),
            troubleshooting: None,
        };
        let update = status_update(&outcome, now);
        assert!(update.injected_to_n8n);
        assert_eq!(update.injected_at, Some(now));
        assert_eq!(update.n8n_credential_id.as_deref(), Some("c1"));
        assert!(update.injection_error.is_none());
        assert_eq!(update.injection_details["strategy"], "basic");
    }

    #[test]
    fn failure_records_message_without_timestamp() {
        let outcome = InjectionOutcome {
            success: false,
            credential_id: None,
            message: "All 3 import strategies failed".into(),
            details: None,
            troubleshooting: None,
        };
        let update = status_update(&outcome, Utc::now());
        assert!(!update.injected_to_n8n);
        assert!(update.injected_at.is_none());
        assert_eq!(
            update.injection_error.as_deref(),
            Some("All 3 import strategies failed")
        );
    }
}
