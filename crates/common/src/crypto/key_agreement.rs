use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::keys::{PublicKey, SecretKey};
use super::CryptoError;

/// Size of the derived symmetric key in bytes (AES-256)
pub const SHARED_KEY_SIZE: usize = 32;

/// Symmetric key agreed between two X25519 parties
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    pub fn as_bytes(&self) -> &[u8; SHARED_KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; SHARED_KEY_SIZE]> for SharedKey {
    fn from(bytes: [u8; SHARED_KEY_SIZE]) -> Self {
        SharedKey(bytes)
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// Derive a symmetric key from a local secret and a peer's public key
///
/// Computes `X25519(local_private, peer_public)` and runs HKDF-SHA256 over the
/// result with an empty salt and empty info, producing 32 bytes.
///
/// # Errors
///
/// Returns `InvalidPeerKey` if `peer_public` is not 32 bytes, or if it is a
/// low-order point: those yield an all-zero shared secret, which is rejected.
pub fn derive_shared_key(
    local_private: &SecretKey,
    peer_public: &[u8],
) -> Result<SharedKey, CryptoError> {
    let peer = PublicKey::try_from(peer_public)?;
    let shared = local_private.as_x25519().diffie_hellman(&peer.to_x25519());

    // all-zero output means the peer sent a small-order point
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidPeerKey);
    }

    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = [0u8; SHARED_KEY_SIZE];
    hk.expand(&[], &mut okm).map_err(|_| CryptoError::KeyDerivation)?;

    Ok(SharedKey(okm))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_both_sides_agree() {
        let alice = SecretKey::generate().unwrap();
        let bob = SecretKey::generate().unwrap();

        let k_ab = derive_shared_key(&alice, bob.public().as_bytes()).unwrap();
        let k_ba = derive_shared_key(&bob, alice.public().as_bytes()).unwrap();
        assert_eq!(k_ab, k_ba);
    }

    #[test]
    fn test_different_peers_disagree() {
        let alice = SecretKey::generate().unwrap();
        let bob = SecretKey::generate().unwrap();
        let mallory = SecretKey::generate().unwrap();

        let k_ab = derive_shared_key(&alice, bob.public().as_bytes()).unwrap();
        let k_am = derive_shared_key(&alice, mallory.public().as_bytes()).unwrap();
        assert_ne!(k_ab, k_am);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let alice = SecretKey::generate().unwrap();
        assert_eq!(
            derive_shared_key(&alice, &[9u8; 31]),
            Err(CryptoError::InvalidPeerKey)
        );
        assert_eq!(
            derive_shared_key(&alice, &[9u8; 33]),
            Err(CryptoError::InvalidPeerKey)
        );
    }

    #[test]
    fn test_rejects_low_order_points() {
        let alice = SecretKey::generate().unwrap();

        // identity
        assert_eq!(
            derive_shared_key(&alice, &[0u8; 32]),
            Err(CryptoError::InvalidPeerKey)
        );

        // u = 1, order 4
        let mut one = [0u8; 32];
        one[0] = 1;
        assert_eq!(
            derive_shared_key(&alice, &one),
            Err(CryptoError::InvalidPeerKey)
        );
    }

    #[test]
    fn test_matches_hkdf_of_raw_secret() {
        let alice = SecretKey::generate().unwrap();
        let bob = SecretKey::generate().unwrap();

        let raw = alice
            .as_x25519()
            .diffie_hellman(&bob.public().to_x25519());
        let mut expected = [0u8; SHARED_KEY_SIZE];
        Hkdf::<Sha256>::new(Some(&[0u8; 32]), raw.as_bytes())
            .expand(b"", &mut expected)
            .unwrap();

        let derived = derive_shared_key(&alice, bob.public().as_bytes()).unwrap();
        assert_eq!(derived.as_bytes(), &expected);
    }
}
