//! Drives a live server over TCP through `ApiClient`

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use url::Url;

use common::credential::StaticLookup;
use common::crypto::SecretKey;
use common::directory::Recipient;
use common::disclosure::VerifiableShare;
use common::rendezvous::DisclosureRequest;
use rendezvous_daemon::http_server::api::client::{ApiClient, ApiError};
use rendezvous_daemon::http_server::{self, Config};
use rendezvous_daemon::{ServiceConfig, ServiceState};

const ORG: &str = "Loopback Labs";

async fn serve(threshold: usize) -> ApiClient {
    let config = ServiceConfig {
        threshold: NonZeroUsize::new(threshold).unwrap(),
        ..ServiceConfig::default()
    };
    let lookup = StaticLookup::new().with_entry("127.0.0.1".parse().unwrap(), ORG);
    let state = ServiceState::new(&config, Arc::new(lookup)).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = http_server::router(Config::new(addr, 2048), state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    ApiClient::new(&Url::parse(&format!("http://{}", addr)).unwrap()).unwrap()
}

fn disclosure(recipient: &SecretKey, id: &str) -> DisclosureRequest {
    DisclosureRequest {
        id: id.to_string(),
        recipient: recipient.public().to_base64(),
        verifiable_share: VerifiableShare {
            data: format!("data-{}", id),
            ephemeral_key: "ephemeral".to_string(),
            commitment: "commitment".to_string(),
        },
    }
}

#[tokio::test]
async fn test_client_submit_read_delete() {
    let client = serve(2).await;
    let recipient = SecretKey::generate().unwrap();

    // the socket peer resolves through the lookup table
    let issued = client.credential().await.unwrap();
    assert_eq!(issued.organization.as_str(), ORG);

    let ack = client
        .disclose(&issued.credential, disclosure(&recipient, "first"))
        .await
        .unwrap();
    assert_eq!(ack, "transmission successful");
    assert!(client.read_inbox(&recipient).await.unwrap().is_empty());

    client
        .disclose(&issued.credential, disclosure(&recipient, "second"))
        .await
        .unwrap();
    let inbox = client.read_inbox(&recipient).await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|entry| entry.org.as_str() == ORG));

    client.delete_entry(&recipient, "first").await.unwrap();
    client.delete_entry(&recipient, "second").await.unwrap();
    assert!(client.read_inbox(&recipient).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_rejected_credential() {
    let client = serve(1).await;
    let recipient = SecretKey::generate().unwrap();

    let err = client
        .disclose("not.a.credential", disclosure(&recipient, "x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::HttpStatus(status, _) if status == reqwest::StatusCode::UNAUTHORIZED
    ));
}

#[tokio::test]
async fn test_client_directory() {
    let client = serve(1).await;
    let zed = SecretKey::generate().unwrap().public();
    let amy = SecretKey::generate().unwrap().public();

    for (name, public_key) in [("Zed Source", zed), ("Amy Editor", amy)] {
        let ack = client
            .register(Recipient {
                name: name.to_string(),
                public_key,
            })
            .await
            .unwrap();
        assert_eq!(ack, "ok");
    }

    let listed = client.recipients().await.unwrap();
    let names: Vec<&str> = listed.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Amy Editor", "Zed Source"]);
    assert_eq!(listed[0].public_key, amy);
}
