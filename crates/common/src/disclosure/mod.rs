//! Quorum-gated disclosure index
//!
//! Shares are indexed `recipient -> organization -> share id -> share`. An
//! organization's shares become readable only once at least `threshold` of
//! them have accumulated for a recipient; below that they are stored but
//! invisible. Writes are never rejected for being below threshold.

mod memory;

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::credential::OrganizationId;
use crate::crypto::PublicKey;

pub use memory::MemoryDisclosureStore;

/// Default reveal quorum
pub const DEFAULT_THRESHOLD: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(threshold) => threshold,
    None => unreachable!(),
};

/// A submitter-produced secret share
///
/// All three fields are opaque here: the commitment is stored and forwarded,
/// never validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableShare {
    pub data: String,
    pub ephemeral_key: String,
    pub commitment: String,
}

/// One revealed share, as returned by an inbox read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    pub id: String,
    pub org: OrganizationId,
    pub verifiable_share: VerifiableShare,
}

/// Storage for disclosures addressed to recipients
///
/// Reads copy entries out; implementations never hand out references into
/// their index, and never keep empty organization or recipient entries.
pub trait DisclosureStore: Send + Sync + fmt::Debug {
    /// Insert or overwrite `share_id` under `(recipient, organization)`
    fn put(
        &self,
        recipient: &PublicKey,
        organization: &OrganizationId,
        share_id: &str,
        share: VerifiableShare,
    );

    /// Every share of every organization at or above threshold
    fn read_quorate(&self, recipient: &PublicKey) -> Vec<InboxEntry>;

    /// Remove `share_id` from every organization under `recipient`
    ///
    /// Succeeds silently when the id is unknown.
    fn delete(&self, recipient: &PublicKey, share_id: &str);

    /// Total shares held for `recipient`, revealed or not
    fn pending(&self, recipient: &PublicKey) -> usize;

    fn threshold(&self) -> NonZeroUsize;
}
