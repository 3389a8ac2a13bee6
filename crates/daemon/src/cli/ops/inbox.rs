use clap::Args;

use common::crypto::{CryptoError, SecretKey};
use rendezvous_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Inbox {
    /// Recipient secret key, base64
    #[arg(long, env = "RENDEZVOUS_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Delete this share id instead of listing the inbox
    #[arg(long)]
    pub delete: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("invalid secret key: {0}")]
    Secret(#[from] CryptoError),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("failed to render inbox: {0}")]
    Render(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inbox {
    type Error = InboxError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = SecretKey::from_base64(&self.secret)?;

        match &self.delete {
            Some(id) => {
                ctx.client.delete_entry(&secret, id).await?;
                Ok(format!("deleted {}", id))
            }
            None => {
                let entries = ctx.client.read_inbox(&secret).await?;
                Ok(serde_json::to_string_pretty(&entries)?)
            }
        }
    }
}
