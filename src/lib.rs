pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::InjectorError;
pub use service::{CredentialInjector, InjectionOutcome};
pub use store::{CredentialStore, SupabaseStore};
