use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::credential::{CredentialSigner, OrganizationLookup};
use common::directory::RecipientDirectory;
use common::rendezvous::Rendezvous;

use crate::lookup::RdapLookup;
use crate::service_config::Config;

/// Main service state, shared by every request handler
#[derive(Clone)]
pub struct State {
    rendezvous: Rendezvous,
    directory: RecipientDirectory,
    signer: Arc<CredentialSigner>,
    lookup: Arc<dyn OrganizationLookup>,
    shutting_down: Arc<AtomicBool>,
}

impl State {
    /// Build state from config, resolving organizations over RDAP
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        tracing::info!(rdap_url = %config.rdap_url, "using RDAP for organization lookup");
        let lookup = RdapLookup::new(config.rdap_url.clone())
            .map_err(|e| StateSetupError::Lookup(e.to_string()))?;
        Self::new(config, Arc::new(lookup))
    }

    /// Build state from config with a caller-supplied organization lookup
    pub fn new(
        config: &Config,
        lookup: Arc<dyn OrganizationLookup>,
    ) -> Result<Self, StateSetupError> {
        let signer = match config.signer.clone() {
            Some(signer) => signer,
            None => {
                tracing::warn!("no signing key configured, credentials will not survive a restart");
                CredentialSigner::generate().map_err(|e| StateSetupError::Signer(e.to_string()))?
            }
        }
        .with_ttl(config.credential_ttl);

        tracing::info!(
            threshold = config.threshold.get(),
            challenge_ttl = ?config.challenge_ttl,
            verifying_key = %signer.verifying_key_base64(),
            "rendezvous state ready"
        );

        Ok(Self {
            rendezvous: Rendezvous::in_memory(config.threshold, config.challenge_ttl),
            directory: RecipientDirectory::new(),
            signer: Arc::new(signer),
            lookup,
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    pub fn directory(&self) -> &RecipientDirectory {
        &self.directory
    }

    pub fn signer(&self) -> &CredentialSigner {
        &self.signer
    }

    pub fn lookup(&self) -> &Arc<dyn OrganizationLookup> {
        &self.lookup
    }

    /// Flag the service as draining; readiness checks fail from here on
    pub fn mark_shutting_down(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

impl AsRef<Rendezvous> for State {
    fn as_ref(&self) -> &Rendezvous {
        &self.rendezvous
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to set up organization lookup: {0}")]
    Lookup(String),
    #[error("failed to set up credential signer: {0}")]
    Signer(String),
}
