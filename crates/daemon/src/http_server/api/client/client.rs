use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde::de::DeserializeOwned;
use url::Url;

use common::credential::IssuedCredential;
use common::crypto::SecretKey;
use common::directory::Recipient;
use common::disclosure::InboxEntry;
use common::rendezvous::{AuthEnvelope, DisclosureRequest};

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::credential::CredentialRequest;
use crate::http_server::api::disclose::DiscloseRequest;
use crate::http_server::api::inbox::challenge::ChallengeRequest;
use crate::http_server::api::inbox::delete::DeleteRequest;
use crate::http_server::api::inbox::read::ReadRequest;
use crate::http_server::api::recipients::RecipientsRequest;
use crate::http_server::api::register::RegisterRequest;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    async fn send<T: ApiRequest>(&self, request: T) -> Result<reqwest::Response, ApiError> {
        let response = request
            .build_request(&self.remote, &self.client)?
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Send a request whose response is JSON
    pub async fn call<T>(&self, request: T) -> Result<T::Response, ApiError>
    where
        T: ApiRequest,
        T::Response: DeserializeOwned,
    {
        Ok(self.send(request).await?.json::<T::Response>().await?)
    }

    /// Send a request whose response is a plain-text acknowledgement
    pub async fn call_text<T>(&self, request: T) -> Result<String, ApiError>
    where
        T: ApiRequest<Response = String>,
    {
        Ok(self.send(request).await?.text().await?)
    }

    /// Answer a fresh challenge for the inbox owned by `secret`
    pub async fn authorize(&self, secret: &SecretKey) -> Result<String, ApiError> {
        let challenge = self
            .call(ChallengeRequest {
                recipient: secret.public().to_url_safe(),
            })
            .await?;
        Ok(AuthEnvelope::respond(&challenge, secret)?.to_bearer()?)
    }

    /// Run the full handshake and read the inbox owned by `secret`
    pub async fn read_inbox(&self, secret: &SecretKey) -> Result<Vec<InboxEntry>, ApiError> {
        let authorization = self.authorize(secret).await?;
        self.call(ReadRequest {
            recipient: secret.public().to_url_safe(),
            authorization,
        })
        .await
    }

    /// Run the full handshake and delete `id` from the inbox owned by `secret`
    pub async fn delete_entry(&self, secret: &SecretKey, id: &str) -> Result<String, ApiError> {
        let authorization = self.authorize(secret).await?;
        self.call_text(DeleteRequest {
            recipient: secret.public().to_url_safe(),
            id: id.to_string(),
            authorization,
        })
        .await
    }

    /// Obtain a credential for the organization owning this client's address
    pub async fn credential(&self) -> Result<IssuedCredential, ApiError> {
        self.call(CredentialRequest).await
    }

    /// Submit a share under `credential`
    pub async fn disclose(
        &self,
        credential: &str,
        disclosure: DisclosureRequest,
    ) -> Result<String, ApiError> {
        self.call_text(DiscloseRequest {
            credential: credential.to_string(),
            disclosure,
        })
        .await
    }

    /// Publish a name for a recipient key
    pub async fn register(&self, recipient: Recipient) -> Result<String, ApiError> {
        self.call_text(RegisterRequest(recipient)).await
    }

    /// List every registered recipient
    pub async fn recipients(&self) -> Result<Vec<Recipient>, ApiError> {
        self.call(RecipientsRequest).await
    }
}
