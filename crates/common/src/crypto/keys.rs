use std::fmt;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::{random_bytes, CryptoError};

/// Size of an X25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Decode base64 in any of the alphabets clients are known to send.
///
/// Paths carry URL-safe keys without padding while JSON bodies carry the
/// standard alphabet, so both are accepted, padded or not.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, CryptoError> {
    let input = input.trim();
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .or_else(|_| STANDARD.decode(input))
        .or_else(|_| STANDARD_NO_PAD.decode(input))
        .map_err(|_| CryptoError::InvalidEncoding)
}

/// X25519 public key identifying a recipient
///
/// This is the recipient's long-term identity: challenges and disclosures are
/// indexed by it. On the wire it travels as URL-safe base64 in paths and as
/// standard base64 in JSON bodies; both decode to the same key.
///
/// # Examples
///
/// ```
/// use common::crypto::{PublicKey, SecretKey};
///
/// let secret = SecretKey::generate().unwrap();
/// let public = secret.public();
/// let parsed = PublicKey::from_base64(&public.to_url_safe()).unwrap();
/// assert_eq!(public, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidPeerKey)?;
        Ok(PublicKey(bytes))
    }
}

impl PublicKey {
    /// Parse a public key from URL-safe or standard base64
    ///
    /// # Errors
    ///
    /// - `InvalidEncoding` if the input is not base64
    /// - `InvalidPeerKey` if it does not decode to exactly 32 bytes
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = decode_base64(encoded)?;
        Self::try_from(bytes.as_slice())
    }

    /// Encode as URL-safe base64 without padding (path form)
    pub fn to_url_safe(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Encode as standard base64 (body form)
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url_safe())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_url_safe()).finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        PublicKey::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// X25519 private key
///
/// Used for the server's per-challenge ephemeral keys and, on the client side,
/// for the recipient's long-term key. The key material is zeroized on drop.
#[derive(Clone)]
pub struct SecretKey(StaticSecret);

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        SecretKey(StaticSecret::from(bytes))
    }
}

impl SecretKey {
    /// Generate a new random secret key using the operating system RNG
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self::from(random_bytes::<PRIVATE_KEY_SIZE>()?))
    }

    /// Parse a secret key from URL-safe or standard base64
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = decode_base64(encoded)?;
        let bytes: [u8; PRIVATE_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidPeerKey)?;
        Ok(Self::from(bytes))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.0).to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Encode as standard base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }

    pub(crate) fn as_x25519(&self) -> &StaticSecret {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public()).finish()
    }
}
