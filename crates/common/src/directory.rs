//! Recipient directory
//!
//! A public listing of recipients and their keys so submitters can find who
//! to address. Registration is unauthenticated and last-write-wins per key;
//! nothing here proves the registrant holds the matching private key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::error::RendezvousError;

/// Longest display name accepted on registration
pub const MAX_NAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    recipients: Arc<RwLock<HashMap<PublicKey, String>>>,
}

impl RecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or rename a recipient
    pub fn register(&self, recipient: Recipient) -> Result<(), RendezvousError> {
        let name = recipient.name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(RendezvousError::MalformedInput(
                "recipient name must be between 1 and 256 bytes".into(),
            ));
        }

        tracing::info!(public_key = %recipient.public_key, name, "registered recipient");
        self.recipients
            .write()
            .insert(recipient.public_key, name.to_string());
        Ok(())
    }

    /// Every registered recipient, sorted by name then key
    pub fn list(&self) -> Vec<Recipient> {
        let mut recipients: Vec<Recipient> = self
            .recipients
            .read()
            .iter()
            .map(|(public_key, name)| Recipient {
                name: name.clone(),
                public_key: *public_key,
            })
            .collect();
        recipients.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.public_key.cmp(&b.public_key))
        });
        recipients
    }

    pub fn get(&self, public_key: &PublicKey) -> Option<String> {
        self.recipients.read().get(public_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.recipients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
