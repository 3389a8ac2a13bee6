use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::challenge::IssuedChallenge;
use common::RendezvousError;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    /// Recipient key, URL-safe base64
    pub recipient: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ChallengeError> {
    let challenge = state.rendezvous().issue_challenge(&key)?;
    Ok((StatusCode::OK, Json(challenge)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),
}

impl IntoResponse for ChallengeError {
    fn into_response(self) -> Response {
        let ChallengeError::Rendezvous(err) = self;
        if err.is_client_error() {
            tracing::debug!("CHALLENGE ERROR: {}", err);
            (StatusCode::BAD_REQUEST, "invalid key encoding").into_response()
        } else {
            tracing::error!("CHALLENGE ERROR: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to generate challenge",
            )
                .into_response()
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ChallengeRequest {
    type Response = IssuedChallenge;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(
            base_url,
            &["inbox", self.recipient.as_str(), "challenge"],
        )?))
    }
}
