use clap::Args;

use common::crypto::{CryptoError, PublicKey};
use common::directory::Recipient;
use rendezvous_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Register {
    /// Name to list the recipient under
    #[arg(long)]
    pub name: String,

    /// Recipient public key, base64 (any alphabet)
    #[arg(long)]
    pub public_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid public key: {0}")]
    Key(#[from] CryptoError),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let public_key = PublicKey::from_base64(&self.public_key)?;
        ctx.client
            .register(Recipient {
                name: self.name.clone(),
                public_key,
            })
            .await?;
        Ok(format!("registered {} as {}", public_key.to_url_safe(), self.name))
    }
}
