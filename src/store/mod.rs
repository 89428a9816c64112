//! Remote credential store.
//!
//! Layout:
//! - `models.rs`: rows read from and patches written to the backend
//! - `supabase.rs`: PostgREST implementation over `reqwest`

pub mod models;
pub mod supabase;

use crate::error::InjectorError;
use async_trait::async_trait;

pub use models::{CredentialRecord, InjectionStatusUpdate, UserConfig};
pub use supabase::SupabaseStore;

/// Source of truth for stored credentials and per-user configuration.
///
/// Lookups return `Ok(None)` when no single row matches; `Err` is reserved
/// for transport or backend failures.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, InjectorError>;

    async fn find_user_config(&self, user_id: &str) -> Result<Option<UserConfig>, InjectorError>;

    async fn update_injection_status(
        &self,
        user_id: &str,
        provider: &str,
        update: &InjectionStatusUpdate,
    ) -> Result<(), InjectorError>;
}
