//! Challenge-gated inbox routes
//!
//! Every authentication failure maps to the same status and body, so a caller
//! cannot tell an unknown nonce from a wrong key or a replay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use common::RendezvousError;

pub mod challenge;
pub mod delete;
pub mod read;

const UNAUTHORIZED_BODY: &str = "challenge failed";

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),
}

impl IntoResponse for InboxError {
    fn into_response(self) -> Response {
        let InboxError::Rendezvous(err) = self;
        if err.is_client_error() {
            tracing::debug!("INBOX AUTH FAILED: {}", err);
            (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response()
        } else {
            tracing::error!("INBOX ERROR: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}
