//! Cryptographic primitives for the rendezvous handshake
//!
//! This module provides everything the challenge-response protocol needs:
//!
//! - **Identity**: X25519 keypairs. A recipient's long-term public key is both
//!   their identity and the index for their challenges and inbox.
//! - **Key Agreement**: X25519 ECDH followed by HKDF-SHA256 (empty salt, empty
//!   info) to obtain a 256-bit symmetric key.
//! - **Authenticated Encryption**: AES-256-GCM with a random 12 byte nonce
//!   prepended to the ciphertext.
//!
//! # Handshake
//!
//! 1. The server generates an ephemeral X25519 keypair and a random token per challenge
//! 2. The client derives `K = HKDF(X25519(client_secret, ephemeral_public))`
//! 3. The client seals the token under `K` and sends it back with the challenge nonce
//! 4. The server derives the same `K` from the ephemeral secret and the client's
//!    public key, opens the envelope and compares the token in constant time

mod cipher;
mod key_agreement;
mod keys;

pub use cipher::{open, seal, NONCE_SIZE, TAG_SIZE};
pub use key_agreement::{derive_shared_key, SharedKey, SHARED_KEY_SIZE};
pub use keys::{decode_base64, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// Errors raised by the cryptographic primitives
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Input could not be decoded from base64
    #[error("invalid base64 encoding")]
    InvalidEncoding,
    /// Peer key has the wrong length or yields a degenerate shared secret
    #[error("invalid peer key")]
    InvalidPeerKey,
    /// Framed ciphertext was truncated or failed authentication
    #[error("decryption failed")]
    DecryptionFailed,
    /// The AEAD refused to encrypt (only possible for absurd message sizes)
    #[error("encryption failed")]
    EncryptionFailed,
    /// HKDF expansion failed
    #[error("key derivation failed")]
    KeyDerivation,
    /// The operating system RNG was unavailable
    #[error("failed to gather randomness: {0}")]
    Randomness(String),
}

/// Fill `buf` from the operating system CSPRNG
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|e| CryptoError::Randomness(e.to_string()))
}

/// Generate `N` random bytes from the operating system CSPRNG
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    fill_random(&mut buf)?;
    Ok(buf)
}
