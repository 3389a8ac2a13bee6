use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::InboxError;
use crate::http_server::api::authorization;
use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct DeleteRequest {
    /// Recipient key, URL-safe base64
    pub recipient: String,
    /// Share id to remove
    pub id: String,
    /// `Bearer` value answering a challenge for `recipient`
    pub authorization: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path((key, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, InboxError> {
    let auth = authorization(&headers).unwrap_or_default();
    state.rendezvous().delete_entry(&key, &id, auth)?;
    Ok((StatusCode::OK, "ok").into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for DeleteRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(
            base_url,
            &["inbox", self.recipient.as_str(), self.id.as_str()],
        )?;
        Ok(client
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, self.authorization))
    }
}
