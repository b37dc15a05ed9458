use crate::utils::validation::is_valid_email;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A syntactically valid email address (`local@domain.tld`, no whitespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidEmail> {
        let value = value.into();
        if is_valid_email(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidEmail(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEmail(pub String);

impl fmt::Display for InvalidEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid email address", self.0)
    }
}

impl std::error::Error for InvalidEmail {}

impl TryFrom<String> for EmailAddress {
    type Error = InvalidEmail;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: EmailAddress,
}

// subject / body 允許空字串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIntent {
    pub receiver: EmailAddress,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactAction {
    Add,
    Update,
    Delete,
}

impl ContactAction {
    pub const ALL: [ContactAction; 3] = [
        ContactAction::Add,
        ContactAction::Update,
        ContactAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactAction::Add => "add",
            ContactAction::Update => "update",
            ContactAction::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdateIntent {
    pub action: ContactAction,
    pub name: String,
    pub email: EmailAddress,
}

/// The structured request a free-text input is parsed into.
///
/// The `type` field is the discriminant on the wire: `"email"` or `"update"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParsedIntent {
    #[serde(rename = "email")]
    Email(EmailIntent),
    #[serde(rename = "update")]
    ContactUpdate(ContactUpdateIntent),
}

impl ParsedIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedIntent::Email(_) => "email",
            ParsedIntent::ContactUpdate(_) => "update",
        }
    }
}

/// Message handed to a [`MailSender`](crate::domain::ports::MailSender).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

impl From<&EmailIntent> for OutgoingMail {
    fn from(intent: &EmailIntent) -> Self {
        Self {
            to: intent.receiver.clone(),
            subject: intent.subject.clone(),
            body: intent.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
    pub attempts: u32,
}

/// One line of the synthetic training set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetExample {
    pub instruction: String,
    pub output: ParsedIntent,
}
