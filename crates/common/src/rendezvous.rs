//! The rendezvous service
//!
//! Ties the challenge registry to the disclosure store. Reads and deletes go
//! through a challenge first; writes are taken on the word of whoever verified
//! the submitter's organization credential.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::challenge::{ChallengeRegistry, IssuedChallenge, MemoryChallengeRegistry};
use crate::credential::OrganizationId;
use crate::crypto::{self, decode_base64, derive_shared_key, PublicKey, SecretKey};
use crate::disclosure::{DisclosureStore, InboxEntry, MemoryDisclosureStore, VerifiableShare};
use crate::error::RendezvousError;

const BEARER_PREFIX: &str = "Bearer ";

/// Proof of key possession answering a single challenge
///
/// Travels as `Authorization: Bearer <base64(JSON)>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEnvelope {
    pub nonce: String,
    pub encrypted_token: String,
}

impl AuthEnvelope {
    /// Answer `challenge` as the holder of `client`
    ///
    /// Derives the shared key against the challenge's ephemeral public key and
    /// seals the token under it.
    pub fn respond(
        challenge: &IssuedChallenge,
        client: &SecretKey,
    ) -> Result<Self, RendezvousError> {
        let ephemeral = PublicKey::from_base64(&challenge.public_key)?;
        let token = decode_base64(&challenge.token)?;
        let key = derive_shared_key(client, ephemeral.as_bytes())?;
        let sealed = crypto::seal(&key, &token)?;

        Ok(Self {
            nonce: challenge.nonce.clone(),
            encrypted_token: STANDARD.encode(sealed),
        })
    }

    /// Parse an `Authorization` header value
    pub fn from_bearer(header: &str) -> Result<Self, RendezvousError> {
        let encoded = strip_bearer(header)
            .ok_or_else(|| RendezvousError::MalformedInput("expected bearer token".into()))?;
        let json = decode_base64(encoded)?;
        serde_json::from_slice(&json)
            .map_err(|_| RendezvousError::MalformedInput("invalid authentication envelope".into()))
    }

    /// Render as an `Authorization` header value
    pub fn to_bearer(&self) -> Result<String, RendezvousError> {
        let json =
            serde_json::to_vec(self).map_err(|e| RendezvousError::Internal(e.to_string()))?;
        Ok(format!("{}{}", BEARER_PREFIX, STANDARD.encode(json)))
    }
}

/// Extract the credential from a `Bearer` authorization value
///
/// The scheme name is matched case-insensitively.
pub fn strip_bearer(header: &str) -> Option<&str> {
    let header = header.trim();
    let scheme = header.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let rest = header.get(BEARER_PREFIX.len()..)?.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Body of a disclosure submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureRequest {
    pub id: String,
    pub recipient: String,
    pub verifiable_share: VerifiableShare,
}

/// Owns the challenge registry and disclosure store for one server
#[derive(Debug, Clone)]
pub struct Rendezvous {
    challenges: Arc<dyn ChallengeRegistry>,
    disclosures: Arc<dyn DisclosureStore>,
}

impl Rendezvous {
    pub fn new(
        challenges: Arc<dyn ChallengeRegistry>,
        disclosures: Arc<dyn DisclosureStore>,
    ) -> Self {
        Self {
            challenges,
            disclosures,
        }
    }

    /// Service backed by the in-memory registry and store
    pub fn in_memory(threshold: NonZeroUsize, challenge_ttl: Option<Duration>) -> Self {
        Self::new(
            Arc::new(MemoryChallengeRegistry::with_ttl(challenge_ttl)),
            Arc::new(MemoryDisclosureStore::new(threshold)),
        )
    }

    pub fn challenges(&self) -> &Arc<dyn ChallengeRegistry> {
        &self.challenges
    }

    pub fn disclosures(&self) -> &Arc<dyn DisclosureStore> {
        &self.disclosures
    }

    /// Issue a challenge for the inbox at `recipient`
    pub fn issue_challenge(&self, recipient: &str) -> Result<IssuedChallenge, RendezvousError> {
        let recipient = PublicKey::from_base64(recipient)?;
        self.challenges.issue(&recipient)
    }

    /// Consume the challenge named in `authorization` on behalf of `recipient`
    ///
    /// The recipient key doubles as the peer key for the handshake. A key that
    /// does not parse cannot own a challenge, so it reports `NoSuchChallenge`.
    pub fn authenticate(
        &self,
        recipient: &str,
        authorization: &str,
    ) -> Result<PublicKey, RendezvousError> {
        let envelope = AuthEnvelope::from_bearer(authorization)?;
        let key = PublicKey::from_base64(recipient).map_err(|_| RendezvousError::NoSuchChallenge)?;

        self.challenges
            .verify(&key, &envelope.nonce, &envelope.encrypted_token, recipient)
            .inspect_err(|e| tracing::debug!(%key, error = %e, "inbox authentication failed"))?;
        Ok(key)
    }

    /// Authenticate, then return every quorate share for `recipient`
    pub fn read_inbox(
        &self,
        recipient: &str,
        authorization: &str,
    ) -> Result<Vec<InboxEntry>, RendezvousError> {
        let key = self.authenticate(recipient, authorization)?;
        let entries = self.disclosures.read_quorate(&key);
        tracing::info!(recipient = %key, entries = entries.len(), "inbox read");
        Ok(entries)
    }

    /// Authenticate, then delete `share_id` wherever it appears in the inbox
    pub fn delete_entry(
        &self,
        recipient: &str,
        share_id: &str,
        authorization: &str,
    ) -> Result<(), RendezvousError> {
        let key = self.authenticate(recipient, authorization)?;
        self.disclosures.delete(&key, share_id);
        tracing::info!(recipient = %key, "inbox entry deleted");
        Ok(())
    }

    /// Store a share under an organization the caller has already verified
    pub fn submit(
        &self,
        organization: &OrganizationId,
        request: DisclosureRequest,
    ) -> Result<PublicKey, RendezvousError> {
        if request.id.trim().is_empty() {
            return Err(RendezvousError::MalformedInput("missing share id".into()));
        }
        let recipient = PublicKey::from_base64(&request.recipient)
            .map_err(|_| RendezvousError::MalformedInput("invalid recipient key".into()))?;

        self.disclosures
            .put(&recipient, organization, &request.id, request.verifiable_share);
        Ok(recipient)
    }

    /// Drop expired challenges, returning how many went
    pub fn evict_expired_challenges(&self) -> usize {
        self.challenges.evict_expired()
    }

    pub fn threshold(&self) -> NonZeroUsize {
        self.disclosures.threshold()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::disclosure::DEFAULT_THRESHOLD;

    fn share() -> VerifiableShare {
        VerifiableShare {
            data: "d".into(),
            ephemeral_key: "e".into(),
            commitment: "c".into(),
        }
    }

    #[test]
    fn test_bearer_roundtrip() {
        let envelope = AuthEnvelope {
            nonce: "bm9uY2U=".into(),
            encrypted_token: "dG9rZW4=".into(),
        };
        let header = envelope.to_bearer().unwrap();
        assert!(header.starts_with("Bearer "));
        assert_eq!(AuthEnvelope::from_bearer(&header).unwrap(), envelope);
        assert_eq!(
            AuthEnvelope::from_bearer(&header.replacen("Bearer", "bearer", 1)).unwrap(),
            envelope
        );
    }

    #[test]
    fn test_bearer_rejects_garbage() {
        for header in ["", "Bearer", "Basic abc", "Bearer %%%", "Bearer aGVsbG8="] {
            assert!(
                matches!(
                    AuthEnvelope::from_bearer(header),
                    Err(RendezvousError::MalformedInput(_))
                ),
                "accepted {:?}",
                header
            );
        }
    }

    #[test]
    fn test_read_requires_fresh_challenge() {
        let service = Rendezvous::in_memory(NonZeroUsize::new(1).unwrap(), None);
        let client = SecretKey::generate().unwrap();
        let recipient = client.public().to_url_safe();

        service
            .submit(
                &OrganizationId::from("Org"),
                DisclosureRequest {
                    id: "s1".into(),
                    recipient: client.public().to_base64(),
                    verifiable_share: share(),
                },
            )
            .unwrap();

        let challenge = service.issue_challenge(&recipient).unwrap();
        let auth = AuthEnvelope::respond(&challenge, &client)
            .unwrap()
            .to_bearer()
            .unwrap();

        let entries = service.read_inbox(&recipient, &auth).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "s1");

        assert_eq!(
            service.read_inbox(&recipient, &auth),
            Err(RendezvousError::NoSuchChallenge)
        );
    }

    #[test]
    fn test_delete_entry() {
        let service = Rendezvous::in_memory(DEFAULT_THRESHOLD, None);
        let client = SecretKey::generate().unwrap();
        let recipient = client.public().to_url_safe();
        let org = OrganizationId::from("Org");

        for id in ["a", "b", "c"] {
            service
                .submit(
                    &org,
                    DisclosureRequest {
                        id: id.into(),
                        recipient: recipient.clone(),
                        verifiable_share: share(),
                    },
                )
                .unwrap();
        }

        let challenge = service.issue_challenge(&recipient).unwrap();
        let auth = AuthEnvelope::respond(&challenge, &client)
            .unwrap()
            .to_bearer()
            .unwrap();
        service.delete_entry(&recipient, "b", &auth).unwrap();
        assert_eq!(service.disclosures().pending(&client.public()), 2);
    }

    #[test]
    fn test_authenticate_with_unparseable_recipient() {
        let service = Rendezvous::in_memory(DEFAULT_THRESHOLD, None);
        let auth = AuthEnvelope {
            nonce: "x".into(),
            encrypted_token: "y".into(),
        }
        .to_bearer()
        .unwrap();
        assert_eq!(
            service.authenticate("not-a-key", &auth),
            Err(RendezvousError::NoSuchChallenge)
        );
    }

    #[test]
    fn test_submit_validation() {
        let service = Rendezvous::in_memory(DEFAULT_THRESHOLD, None);
        let org = OrganizationId::from("Org");
        let recipient = SecretKey::generate().unwrap().public().to_base64();

        let missing_id = DisclosureRequest {
            id: " ".into(),
            recipient: recipient.clone(),
            verifiable_share: share(),
        };
        assert!(matches!(
            service.submit(&org, missing_id),
            Err(RendezvousError::MalformedInput(_))
        ));

        let bad_key = DisclosureRequest {
            id: "a".into(),
            recipient: "AAAA".into(),
            verifiable_share: share(),
        };
        assert!(matches!(
            service.submit(&org, bad_key),
            Err(RendezvousError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_issue_challenge_rejects_bad_key() {
        let service = Rendezvous::in_memory(DEFAULT_THRESHOLD, None);
        assert!(service.issue_challenge("%%%").is_err());
        assert_eq!(
            service.issue_challenge(&STANDARD.encode([7u8; 16])),
            Err(RendezvousError::InvalidPeerKey)
        );
    }
}
