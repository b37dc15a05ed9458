use crate::domain::model::{Contact, ContactAction, ContactUpdateIntent, EmailAddress};
use crate::utils::error::{MailError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store handle shared between the request loop and the HTTP handlers.
/// All mutation goes through the mutex, so there is a single writer at a time.
pub type SharedContacts = Arc<Mutex<ContactStore>>;

/// What `add` does when the name is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddPolicy {
    /// Silently replace the stored address.
    #[default]
    Overwrite,
    /// Fail with `ContactExists`.
    RejectExisting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ContactChange {
    Added {
        name: String,
        email: EmailAddress,
    },
    Replaced {
        name: String,
        previous: EmailAddress,
        email: EmailAddress,
    },
    Updated {
        name: String,
        previous: EmailAddress,
        email: EmailAddress,
    },
    Deleted {
        name: String,
        email: EmailAddress,
    },
}

/// In-memory name → address table, keyed case-sensitively.
#[derive(Debug, Clone, Default)]
pub struct ContactStore {
    contacts: BTreeMap<String, EmailAddress>,
    add_policy: AddPolicy,
}

impl ContactStore {
    pub fn new(add_policy: AddPolicy) -> Self {
        Self {
            contacts: BTreeMap::new(),
            add_policy,
        }
    }

    pub fn with_contacts<I>(contacts: I, add_policy: AddPolicy) -> Self
    where
        I: IntoIterator<Item = (String, EmailAddress)>,
    {
        Self {
            contacts: contacts.into_iter().collect(),
            add_policy,
        }
    }

    pub fn into_shared(self) -> SharedContacts {
        Arc::new(Mutex::new(self))
    }

    pub fn add_policy(&self) -> AddPolicy {
        self.add_policy
    }

    pub fn add(&mut self, name: &str, email: EmailAddress) -> Result<ContactChange> {
        match self.contacts.get_mut(name) {
            Some(_) if self.add_policy == AddPolicy::RejectExisting => {
                Err(MailError::ContactExists {
                    name: name.to_string(),
                })
            }
            Some(stored) => {
                let previous = std::mem::replace(stored, email.clone());
                Ok(ContactChange::Replaced {
                    name: name.to_string(),
                    previous,
                    email,
                })
            }
            None => {
                self.contacts.insert(name.to_string(), email.clone());
                Ok(ContactChange::Added {
                    name: name.to_string(),
                    email,
                })
            }
        }
    }

    pub fn update(&mut self, name: &str, email: EmailAddress) -> Result<ContactChange> {
        let stored = self
            .contacts
            .get_mut(name)
            .ok_or_else(|| MailError::ContactNotFound {
                name: name.to_string(),
            })?;

        let previous = std::mem::replace(stored, email.clone());
        Ok(ContactChange::Updated {
            name: name.to_string(),
            previous,
            email,
        })
    }

    pub fn delete(&mut self, name: &str) -> Result<ContactChange> {
        let email = self
            .contacts
            .remove(name)
            .ok_or_else(|| MailError::ContactNotFound {
                name: name.to_string(),
            })?;

        Ok(ContactChange::Deleted {
            name: name.to_string(),
            email,
        })
    }

    pub fn apply(&mut self, intent: &ContactUpdateIntent) -> Result<ContactChange> {
        match intent.action {
            ContactAction::Add => self.add(&intent.name, intent.email.clone()),
            ContactAction::Update => self.update(&intent.name, intent.email.clone()),
            ContactAction::Delete => self.delete(&intent.name),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EmailAddress> {
        self.contacts.get(name)
    }

    /// Exact match first, then a case-insensitive match if it is unambiguous.
    pub fn resolve_name(&self, name: &str) -> Option<&EmailAddress> {
        if let Some(email) = self.contacts.get(name) {
            return Some(email);
        }

        let mut matches = self
            .contacts
            .iter()
            .filter(|(stored, _)| stored.eq_ignore_ascii_case(name));

        match (matches.next(), matches.next()) {
            (Some((_, email)), None) => Some(email),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmailAddress)> {
        self.contacts.iter().map(|(name, email)| (name.as_str(), email))
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.iter()
            .map(|(name, email)| Contact {
                name: name.to_string(),
                email: email.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
