use clap::Args;

use common::crypto::{CryptoError, SecretKey};

#[derive(Args, Debug, Clone)]
pub struct Keygen;

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("key generation failed: {0}")]
    Crypto(#[from] CryptoError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = SecretKey::generate()?;
        Ok(format!(
            "secret key: {}\npublic key: {}",
            secret.to_base64(),
            secret.public().to_url_safe()
        ))
    }
}
