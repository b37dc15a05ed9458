// Adapters layer: concrete implementations of the domain ports (model backend, mail API, credentials).

pub mod credentials;
pub mod dry_run;
pub mod generator;
pub mod gmail;

pub use credentials::{FileTokenProvider, StaticTokenProvider};
pub use dry_run::DryRunSender;
pub use generator::OllamaGenerator;
pub use gmail::{GmailSender, GmailSettings};
