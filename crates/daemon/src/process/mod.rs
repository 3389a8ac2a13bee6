pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

/// Handle for gracefully shutting down the daemon service.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the service shuts down (via signal or explicit shutdown).
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("failed to set up service state: {0}")]
    State(#[from] crate::service_state::StateSetupError),
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "rendezvous.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

/// Periodically evict expired challenges until shutdown.
pub async fn sweep_challenges(
    state: ServiceState,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = state.rendezvous().evict_expired_challenges();
                if evicted > 0 {
                    tracing::debug!(evicted, "swept expired challenges");
                }
            }
            _ = shutdown_rx.changed() => {
                tracing::debug!("challenge sweeper stopping");
                break;
            }
        }
    }
}

/// Create state and spawn background tasks, returning the state handle.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does not stop the service.
pub async fn start_service(
    service_config: &ServiceConfig,
) -> Result<(ServiceState, ShutdownHandle), ServiceError> {
    let (graceful_waiter, shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker()?;
    let state = ServiceState::from_config(service_config).await?;

    let mut handles = Vec::new();

    // Spawn API server
    let api_port = service_config.api_port;
    let api_addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    let api_state = state.clone();
    let api_config = http_server::Config::new(api_addr, service_config.max_disclosure_bytes);
    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, api_state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });
    handles.push(api_handle);

    // Spawn challenge sweeper (only useful when challenges expire)
    if service_config.challenge_ttl.is_some() {
        let sweep_state = state.clone();
        let sweep_interval = service_config.sweep_interval;
        let sweep_rx = shutdown_rx.clone();
        handles.push(tokio::spawn(sweep_challenges(
            sweep_state,
            sweep_interval,
            sweep_rx,
        )));
    }

    tracing::info!("Running: API on port {}", api_port);

    let handle = ShutdownHandle {
        graceful_waiter,
        handles,
        shutdown_tx,
    };

    Ok((state, handle))
}

/// Spawns the daemon service: API server + challenge sweeper.
/// Blocks until shutdown signal is received. Use for CLI binary usage.
pub async fn spawn_service(service_config: &ServiceConfig) -> Result<(), ServiceError> {
    let _guards = init_logging(service_config);
    let (_, handle) = start_service(service_config).await.inspect_err(|e| {
        tracing::error!("error creating server state: {}", e);
    })?;
    handle.wait().await;
    Ok(())
}
