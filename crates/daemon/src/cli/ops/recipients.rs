use clap::Args;

use rendezvous_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Recipients;

#[derive(Debug, thiserror::Error)]
pub enum RecipientsError {
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Recipients {
    type Error = RecipientsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let recipients = ctx.client.recipients().await?;
        if recipients.is_empty() {
            return Ok("no recipients registered".to_string());
        }

        let lines: Vec<String> = recipients
            .iter()
            .map(|r| format!("{}\t{}", r.public_key.to_url_safe(), r.name))
            .collect();
        Ok(lines.join("\n"))
    }
}
