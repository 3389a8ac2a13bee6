#[allow(clippy::module_inception)]
mod client;
mod error;

use reqwest::{Client, RequestBuilder};
use url::Url;

pub use client::ApiClient;
pub use error::ApiError;

/// A request the API client knows how to send
pub trait ApiRequest {
    type Response;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}

/// Join path segments onto `base`, percent-encoding each one
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
