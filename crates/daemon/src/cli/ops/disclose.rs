use clap::Args;

use common::disclosure::VerifiableShare;
use common::rendezvous::DisclosureRequest;
use rendezvous_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Disclose {
    /// Recipient public key, base64
    #[arg(long)]
    pub recipient: String,

    /// Share id, unique per submission
    #[arg(long)]
    pub id: String,

    /// Share content
    #[arg(long)]
    pub data: String,

    /// Ephemeral key material the share was produced with
    #[arg(long)]
    pub ephemeral_key: String,

    /// Verifiable secret sharing commitment
    #[arg(long)]
    pub commitment: String,

    /// Credential to submit under; a fresh one is requested when omitted
    #[arg(long, env = "RENDEZVOUS_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscloseError {
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Disclose {
    type Error = DiscloseError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let credential = match &self.credential {
            Some(credential) => credential.clone(),
            None => {
                let issued = ctx.client.credential().await?;
                tracing::debug!(organization = %issued.organization, "obtained credential");
                issued.credential
            }
        };

        let request = DisclosureRequest {
            id: self.id.clone(),
            recipient: self.recipient.clone(),
            verifiable_share: VerifiableShare {
                data: self.data.clone(),
                ephemeral_key: self.ephemeral_key.clone(),
                commitment: self.commitment.clone(),
            },
        };
        Ok(ctx.client.disclose(&credential, request).await?)
    }
}
