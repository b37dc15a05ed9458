use crate::domain::model::InvalidEmail;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Text generation failed: {message}")]
    GenerationError { message: String },

    #[error(transparent)]
    InvalidEmail(#[from] InvalidEmail),

    #[error("No JSON object found in model output")]
    ExtractionError,

    #[error("No intent schema matched: {}", reasons.join("; "))]
    ValidationError { reasons: Vec<String> },

    #[error("Contact '{name}' not found")]
    ContactNotFound { name: String },

    #[error("Contact '{name}' already exists")]
    ContactExists { name: String },

    #[error("Credential error: {message}")]
    CredentialError { message: String },

    #[error("Mail delivery failed after {attempts} attempt(s): {message}")]
    MailSendError {
        status: Option<u16>,
        attempts: u32,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Model,
    Request,
    Contacts,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MailError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MailError::ApiError(_) => ErrorCategory::Network,
            MailError::IoError(_) | MailError::SerializationError(_) => ErrorCategory::System,
            MailError::ConfigError { .. }
            | MailError::ConfigValidationError { .. }
            | MailError::InvalidConfigValueError { .. }
            | MailError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MailError::GenerationError { .. } => ErrorCategory::Model,
            MailError::InvalidEmail(_)
            | MailError::ExtractionError
            | MailError::ValidationError { .. } => ErrorCategory::Request,
            MailError::ContactNotFound { .. } | MailError::ContactExists { .. } => {
                ErrorCategory::Contacts
            }
            MailError::CredentialError { .. } | MailError::MailSendError { .. } => {
                ErrorCategory::Delivery
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request | ErrorCategory::Contacts => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Model | ErrorCategory::Delivery => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 請求失敗時是否值得重試 (只針對暫時性的網路錯誤)
    pub fn is_retryable(&self) -> bool {
        match self {
            MailError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MailError::MailSendError { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MailError::ApiError(_) => {
                "Check that the model backend and the mail API are reachable".to_string()
            }
            MailError::IoError(_) => "Check file paths and permissions".to_string(),
            MailError::SerializationError(_) => {
                "Check that the JSON payload is well formed".to_string()
            }
            MailError::ConfigError { .. }
            | MailError::ConfigValidationError { .. }
            | MailError::InvalidConfigValueError { .. }
            | MailError::MissingConfigError { .. } => {
                "Fix the configuration file or command line arguments".to_string()
            }
            MailError::GenerationError { .. } => {
                "Make sure the model server is running and the model is pulled".to_string()
            }
            MailError::InvalidEmail(_) => {
                "Use a full address such as alice@example.com".to_string()
            }
            MailError::ExtractionError | MailError::ValidationError { .. } => {
                "Rephrase the request, e.g. \"Send alice an email saying hi\"".to_string()
            }
            MailError::ContactNotFound { name } => {
                format!("Add '{}' to the contacts first", name)
            }
            MailError::ContactExists { name } => {
                format!("Use an update request to change '{}'", name)
            }
            MailError::CredentialError { .. } => {
                "Authorize the mail account and place a valid token file at the configured token_path"
                    .to_string()
            }
            MailError::MailSendError { .. } => {
                "The request was not delivered; try again later".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MailError::ExtractionError => {
                "I could not understand the model output for that request".to_string()
            }
            MailError::ValidationError { .. } => {
                "The request did not look like an email or a contact update".to_string()
            }
            MailError::ContactNotFound { name } => format!("Cannot find contact {}", name),
            MailError::ContactExists { name } => format!("Contact {} already exists", name),
            MailError::MailSendError { .. } => "The email could not be sent".to_string(),
            other => other.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        MailError::ConfigError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let not_found = MailError::ContactNotFound {
            name: "ghost".to_string(),
        };
        assert_eq!(not_found.category(), ErrorCategory::Contacts);
        assert_eq!(not_found.severity(), ErrorSeverity::Low);

        let config = MailError::config("bad");
        assert_eq!(config.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_retryable_mail_failures() {
        let server_error = MailError::MailSendError {
            status: Some(503),
            attempts: 1,
            message: "unavailable".to_string(),
        };
        assert!(server_error.is_retryable());

        let bad_request = MailError::MailSendError {
            status: Some(400),
            attempts: 1,
            message: "bad".to_string(),
        };
        assert!(!bad_request.is_retryable());
    }

    #[test]
    fn test_validation_message_joins_reasons() {
        let err = MailError::ValidationError {
            reasons: vec!["email: missing field".to_string(), "update: bad".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No intent schema matched: email: missing field; update: bad"
        );
    }
}
