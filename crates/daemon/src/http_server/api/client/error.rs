use reqwest::StatusCode;

use common::RendezvousError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("URL cannot be used as an API base: {0}")]
    InvalidBaseUrl(String),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("failed to answer challenge: {0}")]
    Challenge(#[from] RendezvousError),
}
