use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{DisclosureStore, InboxEntry, VerifiableShare, DEFAULT_THRESHOLD};
use crate::credential::OrganizationId;
use crate::crypto::PublicKey;

type ShareMap = HashMap<String, VerifiableShare>;

/// In-memory disclosure store guarded by one reader-writer lock
#[derive(Debug, Clone)]
pub struct MemoryDisclosureStore {
    inner: Arc<RwLock<MemoryDisclosureStoreInner>>,
    threshold: NonZeroUsize,
}

#[derive(Debug, Default)]
struct MemoryDisclosureStoreInner {
    /// recipient -> organization -> share id -> share
    disclosures: HashMap<PublicKey, HashMap<OrganizationId, ShareMap>>,
}

impl MemoryDisclosureStore {
    pub fn new(threshold: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryDisclosureStoreInner::default())),
            threshold,
        }
    }
}

impl Default for MemoryDisclosureStore {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl DisclosureStore for MemoryDisclosureStore {
    fn put(
        &self,
        recipient: &PublicKey,
        organization: &OrganizationId,
        share_id: &str,
        share: VerifiableShare,
    ) {
        let mut inner = self.inner.write();
        let shares = inner
            .disclosures
            .entry(*recipient)
            .or_default()
            .entry(organization.clone())
            .or_default();
        shares.insert(share_id.to_string(), share);

        tracing::debug!(
            %recipient,
            shares = shares.len(),
            quorate = shares.len() >= self.threshold.get(),
            "stored disclosure"
        );
    }

    fn read_quorate(&self, recipient: &PublicKey) -> Vec<InboxEntry> {
        let inner = self.inner.read();
        let Some(organizations) = inner.disclosures.get(recipient) else {
            return Vec::new();
        };

        organizations
            .iter()
            .filter(|(_, shares)| shares.len() >= self.threshold.get())
            .flat_map(|(org, shares)| {
                shares.iter().map(move |(id, share)| InboxEntry {
                    id: id.clone(),
                    org: org.clone(),
                    verifiable_share: share.clone(),
                })
            })
            .collect()
    }

    fn delete(&self, recipient: &PublicKey, share_id: &str) {
        let mut inner = self.inner.write();
        let Some(organizations) = inner.disclosures.get_mut(recipient) else {
            return;
        };

        organizations.retain(|_, shares| {
            shares.remove(share_id);
            !shares.is_empty()
        });

        if organizations.is_empty() {
            inner.disclosures.remove(recipient);
        }
    }

    fn pending(&self, recipient: &PublicKey) -> usize {
        self.inner
            .read()
            .disclosures
            .get(recipient)
            .map_or(0, |orgs| orgs.values().map(HashMap::len).sum())
    }

    fn threshold(&self) -> NonZeroUsize {
        self.threshold
    }
}

impl MemoryDisclosureStore {
    /// Whether the store holds anything at all for `recipient`
    pub fn has_recipient(&self, recipient: &PublicKey) -> bool {
        self.inner.read().disclosures.contains_key(recipient)
    }

    /// Number of organizations with at least one share for `recipient`
    pub fn organizations(&self, recipient: &PublicKey) -> usize {
        self.inner
            .read()
            .disclosures
            .get(recipient)
            .map_or(0, HashMap::len)
    }
}
