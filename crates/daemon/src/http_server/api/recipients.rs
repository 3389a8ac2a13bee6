use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::directory::Recipient;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default)]
pub struct RecipientsRequest;

pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    Json(state.directory().list())
}

// Client implementation - builds request for this operation
impl ApiRequest for RecipientsRequest {
    type Response = Vec<Recipient>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, &["recipients"])?))
    }
}
