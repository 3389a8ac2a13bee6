use clap::Args;

use rendezvous_daemon::state::{AppConfig, AppState};
use url::Url;

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 8080)]
    pub api_port: u16,

    /// Shares an organization needs before any are revealed
    #[arg(long, default_value_t = 3)]
    pub threshold: usize,

    /// Seconds an unanswered challenge stays valid (0 disables expiry)
    #[arg(long, default_value_t = 300)]
    pub challenge_ttl_secs: u64,

    /// RDAP service used to resolve client addresses to organizations
    #[arg(long)]
    pub rdap_url: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] rendezvous_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            api_port: self.api_port,
            threshold: self.threshold,
            challenge_ttl_secs: self.challenge_ttl_secs,
            rdap_url: self.rdap_url.clone().unwrap_or(defaults.rdap_url.clone()),
            ..defaults
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let verifying_key = state.load_signer()?.verifying_key_base64();

        let output = format!(
            "Initialized rendezvous directory at: {}\n\
             - Signing key: {}\n\
             - Verifying key: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Threshold: {}",
            state.rendezvous_dir.display(),
            state.key_path.display(),
            verifying_key,
            state.config_path.display(),
            state.config.api_port,
            state.config.threshold,
        );

        Ok(output)
    }
}
