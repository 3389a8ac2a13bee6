use clap::Args;

use rendezvous_daemon::state::AppState;
use rendezvous_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] rendezvous_daemon::state::StateError),

    #[error("config error: {0}")]
    ConfigError(#[from] rendezvous_daemon::service_config::ConfigError),

    #[error("daemon failed: {0}")]
    Failed(#[from] rendezvous_daemon::process::ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.rendezvous)
        let state = AppState::load(ctx.config_path.clone())?;
        let signer = state.load_signer()?;

        let mut config = ServiceConfig::from_app_state(&state, signer)?;
        if let Some(api_port) = self.api_port {
            config.api_port = api_port;
        }
        config.log_dir = self.log_dir.clone();

        spawn_service(&config).await?;
        Ok("daemon ended".to_string())
    }
}
