use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use time::OffsetDateTime;
use url::Url;

use common::credential::CredentialError;
use common::rendezvous::{strip_bearer, DisclosureRequest};
use common::RendezvousError;

use crate::http_server::api::authorization;
use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

pub const DISCLOSE_ACK: &str = "transmission successful";

/// A disclosure submission together with the credential that authorizes it
#[derive(Debug, Clone)]
pub struct DiscloseRequest {
    pub credential: String,
    pub disclosure: DisclosureRequest,
}

pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, DiscloseError> {
    let credential = authorization(&headers)
        .and_then(strip_bearer)
        .ok_or(DiscloseError::MissingCredential)?;
    let claims = state
        .signer()
        .verify(credential, OffsetDateTime::now_utc())?;

    let request: DisclosureRequest =
        serde_json::from_slice(&body).map_err(|e| DiscloseError::InvalidBody(e.to_string()))?;
    let recipient = state.rendezvous().submit(&claims.org, request)?;

    tracing::info!(%recipient, "accepted disclosure");
    Ok((StatusCode::OK, DISCLOSE_ACK).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DiscloseError {
    #[error("missing credential")]
    MissingCredential,
    #[error("credential rejected: {0}")]
    Credential(#[from] CredentialError),
    #[error("invalid body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),
}

impl IntoResponse for DiscloseError {
    fn into_response(self) -> Response {
        tracing::warn!("DISCLOSE ERROR: {}", self);
        match self {
            DiscloseError::MissingCredential | DiscloseError::Credential(_) => {
                (StatusCode::UNAUTHORIZED, "invalid or expired credential").into_response()
            }
            DiscloseError::InvalidBody(_) => {
                (StatusCode::BAD_REQUEST, "invalid body").into_response()
            }
            DiscloseError::Rendezvous(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            DiscloseError::Rendezvous(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for DiscloseRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client
            .post(endpoint(base_url, &["disclose"])?)
            .bearer_auth(self.credential)
            .json(&self.disclosure))
    }
}
