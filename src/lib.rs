pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use core::classifier::{classify, try_classify};
pub use core::contact_store::{AddPolicy, ContactStore, SharedContacts};
pub use core::dispatcher::{DispatchReport, Dispatcher};
pub use core::extractor::extract_json;
pub use core::request_loop::{RequestOutcome, RequestPipeline, RequestStage};
pub use domain::model::{ContactAction, EmailAddress, ParsedIntent};
pub use utils::error::{MailError, Result};
