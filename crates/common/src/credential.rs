//! Organization credentials for the disclosure write path
//!
//! A submitter obtains a credential once: the server looks up the
//! organization owning the submitter's network origin and signs a short claim
//! set binding that organization to an issue and expiry time. Submissions
//! present the credential, and the verified organization becomes the group
//! their share is counted under.
//!
//! The rest of the crate trusts the organization string as given; nothing
//! here ties it to a real-world identity.
//!
//! # Token format
//!
//! A compact JWT signed with Ed25519 (`alg: EdDSA`) whose payload is
//! `{"org": ..., "iat": ..., "exp": ...}`. Clients read the organization and
//! expiry straight from the payload segment.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::pkcs8::{EncodePrivateKey, KeypairBytes};
use ed25519_dalek::{SigningKey, VerifyingKey};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::crypto;

/// Credentials are valid for two days unless configured otherwise
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(48 * 60 * 60);
/// PEM tag for the persisted signing key
pub const SIGNING_KEY_PEM_TAG: &str = "PRIVATE KEY";

const SIGNING_KEY_SIZE: usize = 32;
const CREDENTIAL_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Opaque organization identifier attached to a submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrganizationId {
    fn from(name: &str) -> Self {
        OrganizationId(name.to_string())
    }
}

impl From<String> for OrganizationId {
    fn from(name: String) -> Self {
        OrganizationId(name)
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The external organization registry could not answer
    #[error("organization lookup failed: {0}")]
    UpstreamLookupFailed(String),
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("credential signature invalid")]
    BadSignature,
    #[error("credential expired")]
    Expired,
    #[error("signing key error: {0}")]
    Key(String),
}

/// Claims carried by a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub org: OrganizationId,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Response body of a credential request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    pub organization: OrganizationId,
    pub credential: String,
}

/// Resolves a network origin to the organization that owns it
#[async_trait]
pub trait OrganizationLookup: Send + Sync {
    async fn lookup(&self, origin: IpAddr) -> Result<OrganizationId, CredentialError>;
}

/// Lookup backed by a fixed table, with an optional catch-all
///
/// Useful for tests and for deployments behind a known network.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    table: HashMap<IpAddr, OrganizationId>,
    fallback: Option<OrganizationId>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, origin: IpAddr, organization: impl Into<OrganizationId>) -> Self {
        self.table.insert(origin, organization.into());
        self
    }

    pub fn with_fallback(mut self, organization: impl Into<OrganizationId>) -> Self {
        self.fallback = Some(organization.into());
        self
    }
}

#[async_trait]
impl OrganizationLookup for StaticLookup {
    async fn lookup(&self, origin: IpAddr) -> Result<OrganizationId, CredentialError> {
        self.table
            .get(&origin)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                CredentialError::UpstreamLookupFailed(format!("no organization for {}", origin))
            })
    }
}

/// Signs and verifies organization credentials with an Ed25519 key
#[derive(Clone)]
pub struct CredentialSigner {
    key: SigningKey,
    ttl: Duration,
}

impl fmt::Debug for CredentialSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSigner")
            .field("verifying_key", &self.verifying_key_base64())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl From<[u8; SIGNING_KEY_SIZE]> for CredentialSigner {
    fn from(bytes: [u8; SIGNING_KEY_SIZE]) -> Self {
        Self {
            key: SigningKey::from_bytes(&bytes),
            ttl: DEFAULT_CREDENTIAL_TTL,
        }
    }
}

impl CredentialSigner {
    /// Generate a new random signing key using the operating system RNG
    pub fn generate() -> Result<Self, CredentialError> {
        let bytes = crypto::random_bytes::<SIGNING_KEY_SIZE>()
            .map_err(|e| CredentialError::Key(e.to_string()))?;
        Ok(Self::from(bytes))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub fn verifying_key_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.verifying_key().as_bytes())
    }

    /// Encode the signing key in PEM format for storage
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(SIGNING_KEY_PEM_TAG, self.key.to_bytes());
        pem::encode(&pem)
    }

    /// Parse a signing key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is malformed, carries the wrong tag or the
    /// key is not 32 bytes.
    pub fn from_pem(pem_str: &str) -> Result<Self, CredentialError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| CredentialError::Key(format!("failed to parse PEM: {}", e)))?;

        if pem.tag() != SIGNING_KEY_PEM_TAG {
            return Err(CredentialError::Key(format!(
                "invalid PEM tag, expected {}",
                SIGNING_KEY_PEM_TAG
            )));
        }

        let bytes: [u8; SIGNING_KEY_SIZE] = pem.contents().try_into().map_err(|_| {
            CredentialError::Key(format!(
                "invalid signing key size in PEM, expected {}, got {}",
                SIGNING_KEY_SIZE,
                pem.contents().len()
            ))
        })?;
        Ok(Self::from(bytes))
    }

    fn encoding_key(&self) -> Result<EncodingKey, CredentialError> {
        // v1 document: the seed alone, without the optional public key
        let keypair = KeypairBytes {
            secret_key: self.key.to_bytes(),
            public_key: None,
        };
        let der = keypair
            .to_pkcs8_der()
            .map_err(|e| CredentialError::Key(e.to_string()))?;
        Ok(EncodingKey::from_ed_der(der.as_bytes()))
    }

    fn decoding_key(&self) -> Result<DecodingKey, CredentialError> {
        DecodingKey::from_ed_components(&self.verifying_key_base64())
            .map_err(|e| CredentialError::Key(e.to_string()))
    }

    /// Sign a credential for `organization`, valid from `now` for the TTL
    pub fn issue(
        &self,
        organization: OrganizationId,
        now: OffsetDateTime,
    ) -> Result<IssuedCredential, CredentialError> {
        let iat = now.unix_timestamp();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| CredentialError::Key("credential ttl out of range".into()))?;
        let claims = CredentialClaims {
            org: organization.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        let credential = jsonwebtoken::encode(
            &Header::new(CREDENTIAL_ALGORITHM),
            &claims,
            &self.encoding_key()?,
        )
        .map_err(|e| CredentialError::Key(e.to_string()))?;

        Ok(IssuedCredential {
            organization,
            credential,
        })
    }

    /// Verify a credential's signature and expiry, returning its claims
    ///
    /// Expiry is checked against the wall clock by the JWT layer and then
    /// against `now`.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the token is not a JWT or its claims do not parse
    /// - `BadSignature` if the signature was not produced by this key, or the
    ///   header names another algorithm
    /// - `Expired` if `now` is at or past the expiry
    pub fn verify(
        &self,
        credential: &str,
        now: OffsetDateTime,
    ) -> Result<CredentialClaims, CredentialError> {
        let mut validation = Validation::new(CREDENTIAL_ALGORITHM);
        validation.leeway = 0;

        let claims = jsonwebtoken::decode::<CredentialClaims>(
            credential.trim(),
            &self.decoding_key()?,
            &validation,
        )
        .map_err(CredentialError::from)?
        .claims;

        if now.unix_timestamp() >= claims.exp {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                CredentialError::BadSignature
            }
            _ => CredentialError::Malformed(err.to_string()),
        }
    }
}
