use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use common::credential::CredentialSigner;
use url::Url;

use crate::state::AppState;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,
    /// Largest accepted disclosure body, in bytes
    pub max_disclosure_bytes: usize,

    // rendezvous configuration
    /// Reveal quorum per organization
    pub threshold: NonZeroUsize,
    /// Lifetime of an unanswered challenge, `None` for no expiry
    pub challenge_ttl: Option<Duration>,
    /// Interval between sweeps of expired challenges
    pub sweep_interval: Duration,

    // credential configuration
    /// key used to sign organization credentials,
    ///  if not set then a new key will be generated
    pub signer: Option<CredentialSigner>,
    /// Lifetime of issued credentials
    pub credential_ttl: Duration,
    /// RDAP service used to resolve client addresses
    pub rdap_url: Url,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Resolve the runtime configuration from on-disk state
    pub fn from_app_state(state: &AppState, signer: CredentialSigner) -> Result<Self, ConfigError> {
        let config = &state.config;
        Ok(Self {
            api_port: config.api_port,
            max_disclosure_bytes: config.max_disclosure_bytes,
            threshold: config
                .threshold()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            challenge_ttl: config.challenge_ttl(),
            sweep_interval: config.sweep_interval(),
            signer: Some(signer),
            credential_ttl: config.credential_ttl(),
            rdap_url: config.rdap_url.clone(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let app = crate::state::AppConfig::default();
        Self {
            api_port: app.api_port,
            max_disclosure_bytes: app.max_disclosure_bytes,
            threshold: common::disclosure::DEFAULT_THRESHOLD,
            challenge_ttl: app.challenge_ttl(),
            sweep_interval: app.sweep_interval(),
            signer: None,
            credential_ttl: app.credential_ttl(),
            rdap_url: app.rdap_url,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid service configuration: {0}")]
    Invalid(String),
}
