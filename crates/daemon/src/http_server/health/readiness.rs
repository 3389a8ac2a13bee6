use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tokio::time::timeout;

use super::data_source::*;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    match timeout(HEALTH_CHECK_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => {
            let msg = serde_json::json!({"status": "ok"});
            (StatusCode::OK, Json(msg)).into_response()
        }
        Ok(Err(e)) => handle_error(e),
        Err(_) => {
            let msg = serde_json::json!({
                "status": "failure",
                "message": "health check timed out"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
    }
}

fn handle_error(err: DataSourceError) -> Response {
    let message = match err {
        DataSourceError::DependencyFailure => "one or more dependencies aren't available",
        DataSourceError::ShuttingDown => "service is shutting down",
    };
    let msg = serde_json::json!({"status": "failure", "message": message});
    (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
}
