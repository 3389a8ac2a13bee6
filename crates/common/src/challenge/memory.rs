use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{
    decode_nonce, Challenge, ChallengeRegistry, IssuedChallenge, CHALLENGE_NONCE_SIZE,
    DEFAULT_CHALLENGE_TTL,
};
use crate::crypto::PublicKey;
use crate::error::RendezvousError;

/// In-memory challenge registry guarded by a single lock
#[derive(Debug, Clone)]
pub struct MemoryChallengeRegistry {
    inner: Arc<Mutex<MemoryChallengeRegistryInner>>,
    ttl: Option<Duration>,
}

#[derive(Debug, Default)]
struct MemoryChallengeRegistryInner {
    /// recipient -> nonce -> challenge
    challenges: HashMap<PublicKey, HashMap<Nonce, Challenge>>,
}

type Nonce = [u8; CHALLENGE_NONCE_SIZE];

impl MemoryChallengeRegistryInner {
    fn remove(&mut self, recipient: &PublicKey, nonce: &Nonce) -> Option<Challenge> {
        let slot = self.challenges.get_mut(recipient)?;
        let removed = slot.remove(nonce);
        if slot.is_empty() {
            self.challenges.remove(recipient);
        }
        removed
    }
}

impl MemoryChallengeRegistry {
    /// Registry whose challenges expire after [`DEFAULT_CHALLENGE_TTL`]
    pub fn new() -> Self {
        Self::with_ttl(Some(DEFAULT_CHALLENGE_TTL))
    }

    /// Registry with an explicit TTL; `None` keeps challenges until consumed
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryChallengeRegistryInner::default())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Look up a live challenge, evicting it if it has expired
    fn lookup(&self, recipient: &PublicKey, nonce: &Nonce) -> Option<Challenge> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = inner
            .challenges
            .get(recipient)
            .and_then(|slot| slot.get(nonce))
            .map(|challenge| challenge.is_expired(self.ttl, now))?;

        if expired {
            inner.remove(recipient, nonce);
            tracing::debug!(%recipient, "evicted expired challenge on lookup");
            return None;
        }

        inner
            .challenges
            .get(recipient)
            .and_then(|slot| slot.get(nonce))
            .cloned()
    }
}

impl Default for MemoryChallengeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeRegistry for MemoryChallengeRegistry {
    fn issue(&self, recipient: &PublicKey) -> Result<IssuedChallenge, RendezvousError> {
        let challenge = Challenge::generate()?;
        let issued = challenge.issued();
        let now = Instant::now();

        let mut inner = self.inner.lock();
        let slot = inner.challenges.entry(*recipient).or_default();
        if self.ttl.is_some() {
            slot.retain(|_, c| !c.is_expired(self.ttl, now));
        }
        slot.insert(*challenge.nonce(), challenge);

        tracing::debug!(%recipient, outstanding = slot.len(), "issued challenge");
        Ok(issued)
    }

    fn verify(
        &self,
        recipient: &PublicKey,
        nonce: &str,
        encrypted_token: &str,
        peer_public_key: &str,
    ) -> Result<(), RendezvousError> {
        let nonce = decode_nonce(nonce).ok_or(RendezvousError::NoSuchChallenge)?;
        let challenge = self
            .lookup(recipient, &nonce)
            .ok_or(RendezvousError::NoSuchChallenge)?;

        // crypto runs without the lock held
        challenge.authenticate(encrypted_token, peer_public_key)?;

        // only the caller whose removal finds the entry consumes it
        match self.inner.lock().remove(recipient, &nonce) {
            Some(_) => {
                tracing::debug!(%recipient, "challenge consumed");
                Ok(())
            }
            None => Err(RendezvousError::NoSuchChallenge),
        }
    }

    fn contains(&self, recipient: &PublicKey, nonce: &str) -> bool {
        let Some(nonce) = decode_nonce(nonce) else {
            return false;
        };
        let now = Instant::now();
        self.inner
            .lock()
            .challenges
            .get(recipient)
            .and_then(|slot| slot.get(&nonce))
            .is_some_and(|challenge| !challenge.is_expired(self.ttl, now))
    }

    fn outstanding(&self, recipient: &PublicKey) -> usize {
        self.inner
            .lock()
            .challenges
            .get(recipient)
            .map_or(0, HashMap::len)
    }

    fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut inner = self.inner.lock();
        let mut evicted = 0;
        inner.challenges.retain(|_, slot| {
            let before = slot.len();
            slot.retain(|_, c| !c.is_expired(self.ttl, now));
            evicted += before - slot.len();
            !slot.is_empty()
        });
        evicted
    }
}
