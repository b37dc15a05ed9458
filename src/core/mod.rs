pub mod classifier;
pub mod contact_store;
pub mod dataset;
pub mod dispatcher;
pub mod extractor;
pub mod prompt;
pub mod request_loop;

pub use crate::domain::model::{ContactUpdateIntent, EmailIntent, ParsedIntent};
pub use crate::domain::ports::{CredentialProvider, MailSender, TextGenerator};
pub use crate::utils::error::Result;
