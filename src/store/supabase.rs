use super::{CredentialRecord, CredentialStore, InjectionStatusUpdate, UserConfig};
use crate::config::Config;
use crate::error::InjectorError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// PostgREST-backed store (Supabase `rest/v1`).
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_base: Url,
    credentials_table: String,
    user_config_table: String,
}

impl SupabaseStore {
    pub fn new(
        base_url: &Url,
        service_key: &str,
        credentials_table: impl Into<String>,
        user_config_table: impl Into<String>,
    ) -> Result<Self, InjectorError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key)
            .map_err(|e| InjectorError::InvalidBackendConfig(format!("service key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {service_key}"))
            .map_err(|e| InjectorError::InvalidBackendConfig(format!("service key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .user_agent("n8n-injector/0.1".to_string())
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()?;

        // `Url::join` drops the last segment unless the base ends with '/'.
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let rest_base = base.join("rest/v1/")?;

        Ok(Self {
            client,
            rest_base,
            credentials_table: credentials_table.into(),
            user_config_table: user_config_table.into(),
        })
    }

    /// Build a store from config, or `None` when backend credentials are absent.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>, InjectorError> {
        let Some((url, key)) = cfg.backend()? else {
            return Ok(None);
        };
        Self::new(&url, key, &cfg.credentials_table, &cfg.user_config_table).map(Some)
    }

    fn table_url(&self, table: &str) -> Result<Url, InjectorError> {
        Ok(self.rest_base.join(table)?)
    }

    fn eq_filters(filters: &[(&str, &str)]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|(col, val)| (col.to_string(), format!("eq.{val}")))
            .collect()
    }

    /// Select rows matching all filters; `Some` only when exactly one matches.
    async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Option<T>, InjectorError> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(Self::eq_filters(filters));

        let resp = self
            .client
            .get(self.table_url(table)?)
            .query(&query)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(InjectorError::BackendStatus(resp.status()));
        }

        let mut rows: Vec<T> = resp.json().await?;
        match rows.len() {
            1 => Ok(rows.pop()),
            0 => {
                debug!(table, "no matching row");
                Ok(None)
            }
            n => {
                warn!(table, rows = n, "expected a single row, got several");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CredentialStore for SupabaseStore {
    async fn find_credential(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, InjectorError> {
        self.select_single(
            &self.credentials_table,
            &[("user_id", user_id), ("provider", provider)],
        )
        .await
    }

    async fn find_user_config(&self, user_id: &str) -> Result<Option<UserConfig>, InjectorError> {
        self.select_single(&self.user_config_table, &[("user_id", user_id)])
            .await
    }

    async fn update_injection_status(
        &self,
        user_id: &str,
        provider: &str,
        update: &InjectionStatusUpdate,
    ) -> Result<(), InjectorError> {
        let query = Self::eq_filters(&[("user_id", user_id), ("provider", provider)]);
        let resp = self
            .client
            .patch(self.table_url(&self.credentials_table)?)
            .query(&query)
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(InjectorError::BackendStatus(resp.status()));
        }
        Ok(())
    }
}
