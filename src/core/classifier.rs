//! Schema discrimination for extracted JSON objects.
//!
//! Each [`IntentSchema`] checks its literal `type` tag and then deserializes the
//! remaining fields strictly (valid addresses, enumerated actions). Schemas are
//! tried in [`IntentSchema::PRECEDENCE`] order and the first match wins.

use crate::domain::model::{ContactUpdateIntent, EmailIntent, ParsedIntent};
use crate::utils::error::{MailError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSchema {
    Email,
    ContactUpdate,
}

impl IntentSchema {
    pub const PRECEDENCE: [IntentSchema; 2] = [IntentSchema::Email, IntentSchema::ContactUpdate];

    pub fn tag(&self) -> &'static str {
        match self {
            IntentSchema::Email => "email",
            IntentSchema::ContactUpdate => "update",
        }
    }

    /// Validates `value` against this schema alone.
    pub fn validate(&self, value: &Value) -> std::result::Result<ParsedIntent, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        match object.get("type").and_then(Value::as_str) {
            Some(tag) if tag == self.tag() => {}
            Some(other) => return Err(format!("type '{}' is not '{}'", other, self.tag())),
            None => return Err("missing string field 'type'".to_string()),
        }

        let intent = match self {
            IntentSchema::Email => ParsedIntent::Email(
                serde_json::from_value::<EmailIntent>(value.clone()).map_err(|e| e.to_string())?,
            ),
            IntentSchema::ContactUpdate => ParsedIntent::ContactUpdate(
                serde_json::from_value::<ContactUpdateIntent>(value.clone())
                    .map_err(|e| e.to_string())?,
            ),
        };

        Ok(intent)
    }
}

/// Classifies `value`, collecting the reason every schema rejected it on failure.
pub fn try_classify(value: &Value) -> Result<ParsedIntent> {
    let mut reasons = Vec::new();

    for schema in IntentSchema::PRECEDENCE {
        match schema.validate(value) {
            Ok(intent) => return Ok(intent),
            Err(reason) => reasons.push(format!("{}: {}", schema.tag(), reason)),
        }
    }

    Err(MailError::ValidationError { reasons })
}

pub fn classify(value: &Value) -> Option<ParsedIntent> {
    match try_classify(value) {
        Ok(intent) => Some(intent),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}
