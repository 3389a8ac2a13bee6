use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use time::OffsetDateTime;
use url::Url;

use common::credential::{CredentialError, IssuedCredential};

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default)]
pub struct CredentialRequest;

/// Network origin of a request
///
/// Proxies are trusted: the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`, then the socket peer.
pub fn client_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip()))
}

pub async fn handler(
    State(state): State<ServiceState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CredentialRequestError> {
    let origin = client_origin(&headers, peer.map(|ConnectInfo(addr)| addr))
        .ok_or(CredentialRequestError::UnknownOrigin)?;

    let organization = state.lookup().lookup(origin).await?;
    let issued = state
        .signer()
        .issue(organization, OffsetDateTime::now_utc())?;

    tracing::info!(organization = %issued.organization, "issued credential");
    Ok((StatusCode::OK, Json(issued)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialRequestError {
    #[error("could not determine client address")]
    UnknownOrigin,
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl IntoResponse for CredentialRequestError {
    fn into_response(self) -> Response {
        tracing::error!("CREDENTIAL ERROR: {}", self);
        match self {
            CredentialRequestError::UnknownOrigin => {
                (StatusCode::BAD_REQUEST, "could not determine client address").into_response()
            }
            CredentialRequestError::Credential(CredentialError::UpstreamLookupFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not lookup IP organization",
            )
                .into_response(),
            CredentialRequestError::Credential(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "could not sign token").into_response()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CredentialRequest {
    type Response = IssuedCredential;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, &["credential"])?))
    }
}
