use crate::crypto::CryptoError;

/// Errors surfaced by the challenge registry and the rendezvous service
///
/// Every variant except `Internal` is a client error. `NoSuchChallenge` covers
/// unknown recipients, unknown nonces, expired challenges and replays alike.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RendezvousError {
    /// Bad encoding or shape; no state was changed
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Wrong-length or degenerate key material
    #[error("invalid peer key")]
    InvalidPeerKey,
    /// No outstanding challenge for this recipient and nonce
    #[error("no such challenge")]
    NoSuchChallenge,
    /// Envelope did not decrypt, or decrypted to the wrong token
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Server-side failure unrelated to the request (e.g. RNG unavailable)
    #[error("internal error: {0}")]
    Internal(String),
}

impl RendezvousError {
    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RendezvousError::Internal(_))
    }
}

impl From<CryptoError> for RendezvousError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidEncoding => {
                RendezvousError::MalformedInput("invalid base64".to_string())
            }
            CryptoError::InvalidPeerKey => RendezvousError::InvalidPeerKey,
            CryptoError::DecryptionFailed => RendezvousError::AuthenticationFailed,
            CryptoError::EncryptionFailed
            | CryptoError::KeyDerivation
            | CryptoError::Randomness(_) => RendezvousError::Internal(err.to_string()),
        }
    }
}
