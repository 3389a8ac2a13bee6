//! Organization lookup over RDAP
//!
//! Resolves a client address by querying `{base}/ip/{addr}`. The organization
//! is the formatted name (`fn`) from the first entity's vCard, or the network's
//! own `name` when no entity is attached.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use common::credential::{CredentialError, OrganizationId, OrganizationLookup};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const RDAP_ACCEPT: &str = "application/rdap+json, application/json";

#[derive(Debug, Clone)]
pub struct RdapLookup {
    base: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct IpNetwork {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(rename = "vcardArray", default)]
    vcard_array: Option<Value>,
}

impl RdapLookup {
    pub fn new(base: Url) -> Result<Self, CredentialError> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| CredentialError::UpstreamLookupFailed(e.to_string()))?;
        Ok(Self { base, client })
    }

    fn query_url(&self, origin: IpAddr) -> Result<Url, CredentialError> {
        // join() drops the last path segment unless the base ends in '/'
        let mut base = self.base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("ip/{}", origin))
            .map_err(|e| CredentialError::UpstreamLookupFailed(e.to_string()))
    }
}

/// Pull the formatted name out of a jCard (`["vcard", [[name, params, type, value], ...]]`)
fn vcard_formatted_name(vcard: &Value) -> Option<String> {
    vcard
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .find(|property| property.first().and_then(Value::as_str) == Some("fn"))
        .and_then(|property| property.get(3))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn organization_name(network: IpNetwork) -> Option<String> {
    match network.entities.first() {
        Some(entity) => entity.vcard_array.as_ref().and_then(vcard_formatted_name),
        None => network.name,
    }
}

#[async_trait]
impl OrganizationLookup for RdapLookup {
    async fn lookup(&self, origin: IpAddr) -> Result<OrganizationId, CredentialError> {
        let url = self.query_url(origin)?;
        tracing::debug!(%url, "querying RDAP");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, RDAP_ACCEPT)
            .send()
            .await
            .map_err(|e| CredentialError::UpstreamLookupFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CredentialError::UpstreamLookupFailed(format!(
                "RDAP returned {}",
                response.status()
            )));
        }

        let network: IpNetwork = response
            .json()
            .await
            .map_err(|e| CredentialError::UpstreamLookupFailed(e.to_string()))?;

        organization_name(network)
            .filter(|name| !name.trim().is_empty())
            .map(OrganizationId::from)
            .ok_or_else(|| {
                CredentialError::UpstreamLookupFailed(format!(
                    "no organization registered for {}",
                    origin
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> IpNetwork {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_prefers_first_entity_vcard() {
        let network = parse(
            r#"{
                "name": "NET-EXAMPLE",
                "entities": [
                    {"vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "Example University"]
                    ]]},
                    {"vcardArray": ["vcard", [["fn", {}, "text", "Second"]]]}
                ]
            }"#,
        );
        assert_eq!(
            organization_name(network).as_deref(),
            Some("Example University")
        );
    }

    #[test]
    fn test_falls_back_to_network_name() {
        let network = parse(r#"{"name": "NET-EXAMPLE"}"#);
        assert_eq!(organization_name(network).as_deref(), Some("NET-EXAMPLE"));
    }

    #[test]
    fn test_entity_without_vcard() {
        let network = parse(r#"{"name": "NET-EXAMPLE", "entities": [{"handle": "X"}]}"#);
        assert_eq!(organization_name(network), None);
    }

    #[test]
    fn test_query_url() {
        let lookup = RdapLookup::new(Url::parse("https://rdap.example/base").unwrap()).unwrap();
        let url = lookup.query_url("192.0.2.1".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://rdap.example/base/ip/192.0.2.1");

        let lookup = RdapLookup::new(Url::parse("https://rdap.org/").unwrap()).unwrap();
        let url = lookup.query_url("2001:db8::1".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://rdap.org/ip/2001:db8::1");
    }
}
