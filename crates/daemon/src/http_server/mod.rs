use std::net::SocketAddr;

use axum::{Extension, Router};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod handlers;
mod health;

pub use config::Config;

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";

/// Assemble every route the API server exposes
pub fn router(config: Config, state: ServiceState) -> Router {
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .merge(api::router(state.clone(), config.max_disclosure_bytes))
        .fallback(handlers::not_found_handler)
        .layer(Extension(config))
        .with_state(state)
        .layer(trace_layer)
}

/// Run the API HTTP server (serves /_status and the rendezvous routes).
pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let router = router(config, state.clone());

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
        state.mark_shutting_down();
    })
    .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
