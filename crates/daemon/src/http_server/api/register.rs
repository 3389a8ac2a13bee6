use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::directory::Recipient;
use common::RendezvousError;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct RegisterRequest(pub Recipient);

pub async fn handler(
    State(state): State<ServiceState>,
    body: Bytes,
) -> Result<impl IntoResponse, RegisterError> {
    let recipient: Recipient =
        serde_json::from_slice(&body).map_err(|e| RegisterError::InvalidBody(e.to_string()))?;
    state.directory().register(recipient)?;
    Ok((StatusCode::OK, "ok").into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Rejected(#[from] RendezvousError),
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        tracing::warn!("REGISTER ERROR: {}", self);
        (StatusCode::BAD_REQUEST, "invalid body").into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for RegisterRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client
            .post(endpoint(base_url, &["register"])?)
            .json(&self.0))
    }
}
