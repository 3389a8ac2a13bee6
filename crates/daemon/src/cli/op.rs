use std::error::Error;
use std::path::PathBuf;

use url::Url;

use rendezvous_daemon::http_server::api::client::{ApiClient, ApiError};
use rendezvous_daemon::state::AppState;

const DEFAULT_REMOTE: &str = "http://localhost:8080";

/// Resolve the remote URL for the API client.
///
/// Priority: explicit `--remote` flag > config file `api_port` > default port 8080.
pub fn resolve_remote(
    explicit: Option<Url>,
    config_path: Option<PathBuf>,
) -> Result<Url, url::ParseError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    if let Ok(state) = AppState::load(config_path) {
        if let Ok(url) = Url::parse(&format!("http://localhost:{}", state.config.api_port)) {
            return Ok(url);
        }
    }
    Url::parse(DEFAULT_REMOTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_remote_explicit_wins() {
        let explicit = Url::parse("http://example.com:9999").unwrap();
        let result = resolve_remote(Some(explicit.clone()), None).unwrap();
        assert_eq!(result, explicit);
    }

    #[test]
    fn test_resolve_remote_falls_back_to_default() {
        let result = resolve_remote(None, Some(PathBuf::from("/nonexistent"))).unwrap();
        assert_eq!(result.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_resolve_remote_reads_config_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let config = rendezvous_daemon::AppConfig {
            api_port: 7777,
            ..Default::default()
        };
        AppState::init(Some(path.clone()), Some(config)).unwrap();

        let result = resolve_remote(None, Some(path)).unwrap();
        assert_eq!(result.port(), Some(7777));
    }
}

#[derive(Clone)]
pub struct OpContext {
    /// API client (always initialized with default or custom URL)
    pub client: ApiClient,
    /// Optional custom config path (defaults to ~/.rendezvous)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    /// Create context with custom remote URL and optional config path
    pub fn new(remote: Url, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(&remote)?,
            config_path,
        })
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
