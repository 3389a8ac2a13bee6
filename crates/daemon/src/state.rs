use std::num::NonZeroUsize;
use std::time::Duration;
use std::{fs, path::PathBuf};

use common::credential::CredentialSigner;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "rendezvous";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Shares an organization needs before a recipient can read any of them
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Seconds an unanswered challenge stays valid; 0 keeps them forever
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,
    /// Lifetime of an issued organization credential
    #[serde(default = "default_credential_ttl_hours")]
    pub credential_ttl_hours: u64,
    /// RDAP bootstrap service used to resolve client addresses to organizations
    #[serde(default = "default_rdap_url")]
    pub rdap_url: Url,
    /// Largest accepted disclosure body
    #[serde(default = "default_max_disclosure_bytes")]
    pub max_disclosure_bytes: usize,
    /// How often expired challenges are swept
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_api_port() -> u16 {
    8080
}

fn default_threshold() -> usize {
    3
}

fn default_challenge_ttl_secs() -> u64 {
    300
}

fn default_credential_ttl_hours() -> u64 {
    48
}

fn default_rdap_url() -> Url {
    Url::parse("https://rdap.org/").expect("static url")
}

fn default_max_disclosure_bytes() -> usize {
    2 * 1024
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            threshold: default_threshold(),
            challenge_ttl_secs: default_challenge_ttl_secs(),
            credential_ttl_hours: default_credential_ttl_hours(),
            rdap_url: default_rdap_url(),
            max_disclosure_bytes: default_max_disclosure_bytes(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), StateError> {
        if self.threshold == 0 {
            return Err(StateError::InvalidConfig(
                "threshold must be at least 1".into(),
            ));
        }
        if self.max_disclosure_bytes == 0 {
            return Err(StateError::InvalidConfig(
                "max_disclosure_bytes must be positive".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(StateError::InvalidConfig(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn threshold(&self) -> Result<NonZeroUsize, StateError> {
        NonZeroUsize::new(self.threshold)
            .ok_or_else(|| StateError::InvalidConfig("threshold must be at least 1".into()))
    }

    pub fn challenge_ttl(&self) -> Option<Duration> {
        (self.challenge_ttl_secs > 0).then(|| Duration::from_secs(self.challenge_ttl_secs))
    }

    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl_hours.saturating_mul(60 * 60))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the rendezvous directory (~/.rendezvous)
    pub rendezvous_dir: PathBuf,
    /// Path to the credential signing key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the rendezvous directory path (custom or default ~/.rendezvous)
    pub fn rendezvous_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh signing key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let rendezvous_dir = Self::rendezvous_dir(custom_path)?;

        if rendezvous_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let config = config.unwrap_or_default();
        config.validate()?;

        fs::create_dir_all(&rendezvous_dir)?;

        let signer = CredentialSigner::generate()
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = rendezvous_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, signer.to_pem())?;

        let config_path = rendezvous_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            rendezvous_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the rendezvous directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let rendezvous_dir = Self::rendezvous_dir(custom_path)?;

        if !rendezvous_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = rendezvous_dir.join(KEY_FILE_NAME);
        let config_path = rendezvous_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        config.validate()?;

        Ok(Self {
            rendezvous_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the credential signing key, applying the configured credential TTL
    pub fn load_signer(&self) -> Result<CredentialSigner, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let signer = CredentialSigner::from_pem(&pem)
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(signer.with_ttl(self.config.credential_ttl()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("rendezvous directory not initialized. Run 'rendezvous init' first")]
    NotInitialized,

    #[error("rendezvous directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
