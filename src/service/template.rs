use super::fetcher::InjectionSource;
use crate::error::InjectorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// OAuth providers n8n knows how to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Spotify,
    Github,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Google,
        ProviderKind::Spotify,
        ProviderKind::Github,
    ];

    /// n8n credential type name.
    pub fn type_tag(self) -> &'static str {
        match self {
            ProviderKind::Google => "googleOAuth2Api",
            ProviderKind::Spotify => "spotifyOAuth2Api",
            ProviderKind::Github => "githubOAuth2Api",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Google => "Google",
            ProviderKind::Spotify => "Spotify",
            ProviderKind::Github => "GitHub",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = InjectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "spotify" => Ok(ProviderKind::Spotify),
            "github" => Ok(ProviderKind::Github),
            _ => Err(InjectorError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub const TOKEN_TYPE: &str = "Bearer";
pub const GRANT_TYPE: &str = "authorizationCode";

/// One credential entry in n8n's import format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: OAuthCredentialData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCredentialData {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub oauth_token_data: OAuthTokenData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthTokenData {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl CredentialTemplate {
    /// Build a fresh template. Every call gets a new random id.
    pub fn build(source: &InjectionSource, now: DateTime<Utc>) -> Result<Self, InjectorError> {
        let provider: ProviderKind = source.credential.provider.parse()?;
        let cred = &source.credential;

        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            name: format!(
                "{} OAuth2 ({})",
                provider,
                now.format("%Y-%m-%d %H:%M")
            ),
            type_tag: provider.type_tag().to_string(),
            data: OAuthCredentialData {
                client_id: cred.client_id.clone(),
                client_secret: cred.client_secret.clone(),
                grant_type: GRANT_TYPE.to_string(),
                oauth_token_data: OAuthTokenData {
                    access_token: cred.access_token.clone(),
                    refresh_token: cred.refresh_token.clone(),
                    token_type: TOKEN_TYPE.to_string(),
                },
            },
        })
    }
}
