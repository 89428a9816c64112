//! Injection pipeline: fetch → template → import file → subprocess import → status.

pub mod classifier;
pub mod cli_probe;
pub mod fetcher;
pub mod import_file;
pub mod importer;
pub mod injector;
pub mod runner;
pub mod status;
pub mod template;

pub use classifier::{MarkerClassifier, OutcomeClassifier};
pub use cli_probe::CliProbe;
pub use importer::{ImportStrategy, InjectionOutcome, SubprocessImporter, Troubleshooting};
pub use injector::{BackendStore, CredentialInjector};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner};
pub use template::{CredentialTemplate, ProviderKind};
