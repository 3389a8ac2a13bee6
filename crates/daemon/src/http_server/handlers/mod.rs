use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Fallback for unknown routes; JSON for API clients, plain text otherwise
pub async fn not_found_handler(headers: HeaderMap) -> Response {
    let wants_json = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    if wants_json {
        let err_msg = serde_json::json!({"error": "not found"});
        (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response()
    }
}
