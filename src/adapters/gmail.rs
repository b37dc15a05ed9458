use crate::domain::model::{DeliveryReceipt, OutgoingMail};
use crate::domain::ports::{CredentialProvider, MailSender};
use crate::utils::error::{MailError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

#[derive(Debug, Clone)]
pub struct GmailSettings {
    pub api_base: String,
    /// `From` header; Gmail fills in the authorized account when absent.
    pub sender: Option<String>,
    /// Extra attempts after the first one.
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            api_base: GMAIL_API_BASE.to_string(),
            sender: None,
            retry_attempts: 2,
            retry_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// Sends plain-text mail through the Gmail REST API (`users.messages.send`).
pub struct GmailSender {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
    settings: GmailSettings,
}

impl GmailSender {
    pub fn new(credentials: Arc<dyn CredentialProvider>, settings: GmailSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            credentials,
            settings,
        })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/gmail/v1/users/me/messages/send",
            self.settings.api_base.trim_end_matches('/')
        )
    }

    async fn try_send(&self, raw: &str, attempt: u32) -> Result<Option<String>> {
        let token = self.credentials.access_token().await?;

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::MailSendError {
                status: Some(status.as_u16()),
                attempts: attempt,
                message: body,
            });
        }

        // 已送達；回應內容讀不到只代表拿不到 message id
        match response.json::<SendResponse>().await {
            Ok(sent) => Ok(sent.id),
            Err(e) => {
                tracing::warn!("⚠️ Mail accepted ({}) but response was unreadable: {}", status, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MailSender for GmailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt> {
        let raw = encode_raw(&build_mime_message(self.settings.sender.as_deref(), mail));
        let max_attempts = self.settings.retry_attempts + 1;
        let mut attempt = 1;

        loop {
            match self.try_send(&raw, attempt).await {
                Ok(message_id) => {
                    return Ok(DeliveryReceipt {
                        message_id,
                        attempts: attempt,
                    })
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        "⚠️ Mail send attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        self.settings.retry_delay
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Mail to {} not delivered: {}", mail.to, e);
                    return Err(into_delivery_error(e, attempt));
                }
            }
        }
    }
}

fn into_delivery_error(error: MailError, attempts: u32) -> MailError {
    match error {
        MailError::ApiError(e) => MailError::MailSendError {
            status: e.status().map(|s| s.as_u16()),
            attempts,
            message: e.to_string(),
        },
        MailError::MailSendError {
            status, message, ..
        } => MailError::MailSendError {
            status,
            attempts,
            message,
        },
        other => other,
    }
}

/// Builds an RFC 5322 `text/plain` message with a base64 body.
pub fn build_mime_message(from: Option<&str>, mail: &OutgoingMail) -> String {
    let mut message = String::new();
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: base64\r\n");
    message.push_str(&format!("to: {}\r\n", mail.to));
    if let Some(from) = from {
        message.push_str(&format!("from: {}\r\n", from));
    }
    message.push_str(&format!("subject: {}\r\n", encode_header(&mail.subject)));
    message.push_str("\r\n");

    let body = STANDARD.encode(mail.body.as_bytes());
    for chunk in body.as_bytes().chunks(76) {
        // base64 輸出只含 ASCII
        message.push_str(&String::from_utf8_lossy(chunk));
        message.push_str("\r\n");
    }
    message
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() && !value.contains(['\r', '\n']) {
        value.to_string()
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

pub fn encode_raw(mime: &str) -> String {
    URL_SAFE.encode(mime.as_bytes())
}
