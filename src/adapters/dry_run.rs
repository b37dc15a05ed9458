use crate::domain::model::{DeliveryReceipt, OutgoingMail};
use crate::domain::ports::MailSender;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Logs mail instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSender;

#[async_trait]
impl MailSender for DryRunSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt> {
        tracing::info!(
            "🔍 DRY RUN - to_address: {}, subject: {}, body_text: {}",
            mail.to,
            mail.subject,
            mail.body
        );
        Ok(DeliveryReceipt {
            message_id: None,
            attempts: 0,
        })
    }
}
