//! Authenticated encryption with AES-256-GCM
//!
//! Framing is `nonce (12 bytes) || ciphertext || tag (16 bytes)`. A fresh
//! random nonce is drawn for every call to [`seal`], and no associated data
//! is bound.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use super::key_agreement::SharedKey;
use super::{random_bytes, CryptoError};

/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

fn cipher(key: &SharedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt `plaintext` under `key`
///
/// Returns `nonce || ciphertext_with_tag`.
///
/// # Errors
///
/// Fails only if the system RNG is unavailable.
pub fn seal(key: &SharedKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce_bytes = random_bytes::<NONCE_SIZE>()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher(key)
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a framed ciphertext produced by [`seal`]
///
/// # Errors
///
/// Returns `DecryptionFailed` if the input is shorter than a nonce or the tag
/// does not verify. No plaintext is ever returned on failure.
pub fn open(key: &SharedKey, framed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if framed.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce, ciphertext) = framed.split_at(NONCE_SIZE);
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}
