use crate::domain::model::{DeliveryReceipt, OutgoingMail};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Turns a prompt into a raw completion. Any local or remote model backend fits here.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt>;
}

/// Hands out a bearer token for the mail API, refreshing it when it has expired.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}
