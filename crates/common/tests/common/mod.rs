//! Shared test utilities for rendezvous integration tests
#![allow(dead_code)]

use std::num::NonZeroUsize;

use common::credential::OrganizationId;
use common::crypto::SecretKey;
use common::disclosure::VerifiableShare;
use common::rendezvous::{AuthEnvelope, DisclosureRequest, Rendezvous};

/// A recipient holding a fresh keypair
pub struct TestRecipient {
    pub secret: SecretKey,
}

impl TestRecipient {
    pub fn new() -> Self {
        Self {
            secret: SecretKey::generate().unwrap(),
        }
    }

    /// Key as it appears in inbox paths
    pub fn path_key(&self) -> String {
        self.secret.public().to_url_safe()
    }

    /// Fetch and answer a challenge, returning the authorization header
    pub fn authorize(&self, service: &Rendezvous) -> String {
        let challenge = service.issue_challenge(&self.path_key()).unwrap();
        AuthEnvelope::respond(&challenge, &self.secret)
            .unwrap()
            .to_bearer()
            .unwrap()
    }
}

pub fn service(threshold: usize) -> Rendezvous {
    Rendezvous::in_memory(NonZeroUsize::new(threshold).unwrap(), None)
}

pub fn share(tag: &str) -> VerifiableShare {
    VerifiableShare {
        data: format!("share-{}", tag),
        ephemeral_key: format!("ephemeral-{}", tag),
        commitment: format!("commitment-{}", tag),
    }
}

/// Submit `id` to `recipient` as `org`
pub fn disclose(service: &Rendezvous, recipient: &TestRecipient, org: &str, id: &str) {
    service
        .submit(
            &OrganizationId::from(org),
            DisclosureRequest {
                id: id.to_string(),
                recipient: recipient.secret.public().to_base64(),
                verifiable_share: share(id),
            },
        )
        .unwrap();
}
