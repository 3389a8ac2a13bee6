/**
 * Single-use challenges proving possession
 *  of a recipient key before inbox access.
 */
pub mod challenge;
/**
 * Signed organization credentials and the
 *  lookup trait that resolves a network
 *  origin to an organization.
 */
pub mod credential;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - X25519 + HKDF key agreement
 *  - AES-256-GCM sealing
 */
pub mod crypto;
/**
 * Public name -> key listing of recipients.
 */
pub mod directory;
/**
 * Quorum-gated storage of disclosed shares.
 */
pub mod disclosure;
pub mod error;
/**
 * The service tying challenges to the
 *  disclosure store, plus its wire types.
 */
pub mod rendezvous;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub use error::RendezvousError;

pub mod prelude {
    pub use crate::challenge::{ChallengeRegistry, IssuedChallenge, MemoryChallengeRegistry};
    pub use crate::credential::{
        CredentialError, CredentialSigner, IssuedCredential, OrganizationId, OrganizationLookup,
    };
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::directory::{Recipient, RecipientDirectory};
    pub use crate::disclosure::{
        DisclosureStore, InboxEntry, MemoryDisclosureStore, VerifiableShare,
    };
    pub use crate::error::RendezvousError;
    pub use crate::rendezvous::{AuthEnvelope, DisclosureRequest, Rendezvous};
    pub use crate::version::build_info;
}
