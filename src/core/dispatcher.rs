use crate::core::contact_store::{ContactChange, SharedContacts};
use crate::domain::model::{DeliveryReceipt, EmailAddress, OutgoingMail, ParsedIntent};
use crate::domain::ports::MailSender;
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchReport {
    MailSent {
        to: EmailAddress,
        receipt: DeliveryReceipt,
    },
    ContactChanged {
        change: ContactChange,
    },
}

/// Executes validated intents against the contact store or the mail sender.
#[derive(Clone)]
pub struct Dispatcher {
    contacts: SharedContacts,
    mailer: Arc<dyn MailSender>,
}

impl Dispatcher {
    pub fn new(contacts: SharedContacts, mailer: Arc<dyn MailSender>) -> Self {
        Self { contacts, mailer }
    }

    pub fn contacts(&self) -> &SharedContacts {
        &self.contacts
    }

    pub async fn dispatch(&self, intent: &ParsedIntent) -> Result<DispatchReport> {
        match intent {
            ParsedIntent::ContactUpdate(update) => {
                let result = self.contacts.lock().await.apply(update);
                match result {
                    Ok(change) => {
                        log_change(&change);
                        Ok(DispatchReport::ContactChanged { change })
                    }
                    Err(e) => {
                        tracing::warn!("❌ Cannot {} contact: {}", update.action.as_str(), e);
                        Err(e)
                    }
                }
            }
            ParsedIntent::Email(email) => {
                tracing::info!(
                    "Sending mail to: {}, subject: {:?}",
                    email.receiver,
                    email.subject
                );
                let receipt = self.mailer.send(&OutgoingMail::from(email)).await?;
                tracing::info!("✅ Email sent to {}", email.receiver);
                Ok(DispatchReport::MailSent {
                    to: email.receiver.clone(),
                    receipt,
                })
            }
        }
    }
}

fn log_change(change: &ContactChange) {
    match change {
        ContactChange::Added { name, email } => {
            tracing::info!("✅ Added contact {} -> {}", name, email)
        }
        ContactChange::Replaced { name, email, .. } => {
            tracing::info!("✅ Replaced contact {} -> {}", name, email)
        }
        ContactChange::Updated { name, email, .. } => {
            tracing::info!("✅ Updated contact {} -> {}", name, email)
        }
        ContactChange::Deleted { name, .. } => tracing::info!("✅ Deleted contact {}", name),
    }
}
