use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::disclosure::InboxEntry;

use super::InboxError;
use crate::http_server::api::authorization;
use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Recipient key, URL-safe base64
    pub recipient: String,
    /// `Bearer` value answering a challenge for `recipient`
    pub authorization: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, InboxError> {
    let auth = authorization(&headers).unwrap_or_default();
    let entries = state.rendezvous().read_inbox(&key, auth)?;
    Ok((StatusCode::OK, Json(entries)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for ReadRequest {
    type Response = Vec<InboxEntry>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client
            .get(endpoint(base_url, &["inbox", self.recipient.as_str()])?)
            .header(reqwest::header::AUTHORIZATION, self.authorization))
    }
}
