//! Single-use challenges gating inbox access
//!
//! A challenge moves through exactly one transition:
//!
//! ```text
//! Issued --verify ok--> Consumed (entry removed)
//! Issued --ttl elapsed--> Expired (entry removed on next lookup or sweep)
//! ```
//!
//! Failed verification attempts leave the challenge in place.

mod memory;

use std::fmt;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::crypto::{
    self, decode_base64, derive_shared_key, PublicKey, SecretKey, PUBLIC_KEY_SIZE,
};
use crate::error::RendezvousError;

pub use memory::MemoryChallengeRegistry;

/// Size of the challenge token in bytes
pub const TOKEN_SIZE: usize = 32;
/// Size of the challenge nonce in bytes
pub const CHALLENGE_NONCE_SIZE: usize = 32;
/// How long an unconsumed challenge stays valid unless configured otherwise
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Server-side record of an outstanding challenge
///
/// The ephemeral secret never leaves the registry; only [`IssuedChallenge`]
/// is handed to the client.
#[derive(Clone)]
pub struct Challenge {
    token: [u8; TOKEN_SIZE],
    ephemeral: SecretKey,
    nonce: [u8; CHALLENGE_NONCE_SIZE],
    issued_at: Instant,
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("nonce", &self.encoded_nonce())
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// The public half of a challenge, as returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedChallenge {
    /// Base64 of the 32 byte token the client must seal
    pub token: String,
    /// Base64 of the per-challenge ephemeral X25519 public key
    pub public_key: String,
    /// Base64 of the 32 byte nonce identifying this challenge
    pub nonce: String,
}

impl Challenge {
    /// Draw a fresh token, ephemeral keypair and nonce from the OS RNG
    pub fn generate() -> Result<Self, RendezvousError> {
        Ok(Self {
            token: crypto::random_bytes::<TOKEN_SIZE>()?,
            ephemeral: SecretKey::generate()?,
            nonce: crypto::random_bytes::<CHALLENGE_NONCE_SIZE>()?,
            issued_at: Instant::now(),
        })
    }

    /// Nonce as handed to the client
    pub fn encoded_nonce(&self) -> String {
        STANDARD.encode(self.nonce)
    }

    pub fn nonce(&self) -> &[u8; CHALLENGE_NONCE_SIZE] {
        &self.nonce
    }

    pub fn issued(&self) -> IssuedChallenge {
        IssuedChallenge {
            token: STANDARD.encode(self.token),
            public_key: self.ephemeral.public().to_base64(),
            nonce: self.encoded_nonce(),
        }
    }

    pub fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.issued_at) >= ttl,
            None => false,
        }
    }

    /// Check an envelope against this challenge without consuming it
    ///
    /// # Errors
    ///
    /// - `MalformedInput` if the token or peer key are not base64
    /// - `InvalidPeerKey` if the peer key is not 32 bytes or is degenerate
    /// - `AuthenticationFailed` if the envelope does not open or holds the wrong token
    pub fn authenticate(
        &self,
        encrypted_token: &str,
        peer_public_key: &str,
    ) -> Result<(), RendezvousError> {
        let framed = decode_base64(encrypted_token)
            .map_err(|_| RendezvousError::MalformedInput("invalid encrypted token".into()))?;
        let peer = decode_base64(peer_public_key)
            .map_err(|_| RendezvousError::MalformedInput("invalid public key".into()))?;
        if peer.len() != PUBLIC_KEY_SIZE {
            return Err(RendezvousError::InvalidPeerKey);
        }

        let key = derive_shared_key(&self.ephemeral, &peer)?;
        let decrypted = crypto::open(&key, &framed)?;

        if decrypted.as_slice().ct_eq(&self.token).into() {
            Ok(())
        } else {
            Err(RendezvousError::AuthenticationFailed)
        }
    }
}

/// Decode a nonce as echoed by a client
///
/// Accepts any base64 alphabet, padded or not. Anything that is not exactly
/// [`CHALLENGE_NONCE_SIZE`] bytes yields `None`.
pub fn decode_nonce(encoded: &str) -> Option<[u8; CHALLENGE_NONCE_SIZE]> {
    decode_base64(encoded).ok()?.try_into().ok()
}

/// Issues and consumes challenges per recipient key
///
/// Implementations index outstanding challenges by `(recipient, nonce)` and
/// must guarantee that a challenge is consumed at most once, even under
/// concurrent verification.
pub trait ChallengeRegistry: Send + Sync + fmt::Debug {
    /// Create and store a new challenge for `recipient`
    ///
    /// A nonce collision for the same recipient overwrites the older entry.
    fn issue(&self, recipient: &PublicKey) -> Result<IssuedChallenge, RendezvousError>;

    /// Verify an envelope and consume the challenge on success
    ///
    /// Unknown recipients, unknown nonces, expired challenges and replays all
    /// fail with `NoSuchChallenge`.
    fn verify(
        &self,
        recipient: &PublicKey,
        nonce: &str,
        encrypted_token: &str,
        peer_public_key: &str,
    ) -> Result<(), RendezvousError>;

    /// Whether an unexpired challenge is outstanding for `(recipient, nonce)`
    ///
    /// `nonce` is matched by its decoded bytes, whatever base64 alphabet it uses.
    fn contains(&self, recipient: &PublicKey, nonce: &str) -> bool;

    /// Number of challenges held for `recipient`, expired ones included
    fn outstanding(&self, recipient: &PublicKey) -> usize;

    /// Drop every expired challenge, returning how many were removed
    fn evict_expired(&self) -> usize;
}
