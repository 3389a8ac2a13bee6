use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod client;
pub mod credential;
pub mod disclose;
pub mod inbox;
pub mod recipients;
pub mod register;

use crate::ServiceState;

pub fn router(state: ServiceState, max_disclosure_bytes: usize) -> Router<ServiceState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(vec![ACCEPT, ORIGIN, AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route("/credential", get(credential::handler))
        .route(
            "/disclose",
            post(disclose::handler).layer(DefaultBodyLimit::max(max_disclosure_bytes)),
        )
        .route("/register", post(register::handler))
        .route("/recipients", get(recipients::handler))
        .route("/inbox/:key/challenge", get(inbox::challenge::handler))
        .route("/inbox/:key", get(inbox::read::handler))
        .route("/inbox/:key/:id", delete(inbox::delete::handler))
        .with_state(state)
        .layer(cors_layer)
}

/// Value of the `Authorization` header, if present and valid UTF-8
pub(crate) fn authorization(headers: &http::HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}
