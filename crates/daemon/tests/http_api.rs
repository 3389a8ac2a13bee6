//! Drives the full API router in-process, without binding a socket

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::challenge::IssuedChallenge;
use common::credential::{IssuedCredential, StaticLookup};
use common::crypto::SecretKey;
use common::disclosure::InboxEntry;
use common::rendezvous::AuthEnvelope;
use rendezvous_daemon::http_server::{self, Config};
use rendezvous_daemon::{ServiceConfig, ServiceState};

const MAX_BODY: usize = 2048;
const ORG: &str = "Example University";

fn app(threshold: usize) -> Router {
    app_with_lookup(threshold, StaticLookup::new().with_fallback(ORG))
}

fn app_with_lookup(threshold: usize, lookup: StaticLookup) -> Router {
    let config = ServiceConfig {
        threshold: NonZeroUsize::new(threshold).unwrap(),
        ..ServiceConfig::default()
    };
    let state = ServiceState::new(&config, Arc::new(lookup)).unwrap();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    http_server::router(Config::new(addr, MAX_BODY), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn credential(app: &Router) -> String {
    let request = Request::builder()
        .uri("/credential")
        .header("x-forwarded-for", "192.0.2.10, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    let issued: IssuedCredential = serde_json::from_slice(&body).unwrap();
    assert_eq!(issued.organization.as_str(), ORG);
    issued.credential
}

fn disclose_request(credential: &str, recipient: &SecretKey, id: &str) -> Request<Body> {
    let body = json!({
        "id": id,
        "recipient": recipient.public().to_base64(),
        "verifiableShare": {
            "data": format!("data-{}", id),
            "ephemeralKey": "ephemeral",
            "commitment": "commitment",
        }
    });
    Request::builder()
        .method(Method::POST)
        .uri("/disclose")
        .header(header::AUTHORIZATION, format!("Bearer {}", credential))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn authorize(app: &Router, secret: &SecretKey) -> String {
    let key = secret.public().to_url_safe();
    let (status, body) = send(app, get(&format!("/inbox/{}/challenge", key))).await;
    assert_eq!(status, StatusCode::OK);
    let challenge: IssuedChallenge = serde_json::from_slice(&body).unwrap();
    AuthEnvelope::respond(&challenge, secret)
        .unwrap()
        .to_bearer()
        .unwrap()
}

fn authorized(method: Method, uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

async fn read_inbox(app: &Router, secret: &SecretKey) -> Vec<InboxEntry> {
    let auth = authorize(app, secret).await;
    let uri = format!("/inbox/{}", secret.public().to_url_safe());
    let (status, body) = send(app, authorized(Method::GET, &uri, &auth)).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_disclose_then_read_after_quorum() {
    let app = app(2);
    let recipient = SecretKey::generate().unwrap();
    let credential = credential(&app).await;

    let (status, body) = send(&app, disclose_request(&credential, &recipient, "a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"transmission successful");
    assert!(read_inbox(&app, &recipient).await.is_empty());

    let (status, _) = send(&app, disclose_request(&credential, &recipient, "b")).await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<String> = read_inbox(&app, &recipient)
        .await
        .into_iter()
        .map(|entry| {
            assert_eq!(entry.org.as_str(), ORG);
            entry.id
        })
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_credential_for_unregistered_network() {
    let app = app_with_lookup(1, StaticLookup::new());
    let request = Request::builder()
        .uri("/credential")
        .header("x-forwarded-for", "198.51.100.7")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"could not lookup IP organization");
}

#[tokio::test]
async fn test_credential_without_client_address() {
    // no forwarding headers and no socket peer
    let app = app(1);
    let (status, body) = send(&app, get("/credential")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"could not determine client address");
}

#[tokio::test]
async fn test_replayed_authorization_rejected() {
    let app = app(1);
    let recipient = SecretKey::generate().unwrap();
    let auth = authorize(&app, &recipient).await;
    let uri = format!("/inbox/{}", recipient.public().to_url_safe());

    let (status, _) = send(&app, authorized(Method::GET, &uri, &auth)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, authorized(Method::GET, &uri, &auth)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, b"challenge failed");
}

#[tokio::test]
async fn test_authorization_bound_to_recipient() {
    let app = app(1);
    let alice = SecretKey::generate().unwrap();
    let mallory = SecretKey::generate().unwrap();

    // mallory answers her own challenge, then tries it against alice's inbox
    let auth = authorize(&app, &mallory).await;
    let uri = format!("/inbox/{}", alice.public().to_url_safe());
    let (status, _) = send(&app, authorized(Method::GET, &uri, &auth)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_or_garbled_authorization() {
    let app = app(1);
    let recipient = SecretKey::generate().unwrap();
    let uri = format!("/inbox/{}", recipient.public().to_url_safe());

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, authorized(Method::GET, &uri, "Bearer not-base64!")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_challenge_for_invalid_key() {
    let app = app(1);
    let (status, body) = send(&app, get("/inbox/not-a-key/challenge")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"invalid key encoding");
}

#[tokio::test]
async fn test_delete_entry() {
    let app = app(1);
    let recipient = SecretKey::generate().unwrap();
    let credential = credential(&app).await;
    send(&app, disclose_request(&credential, &recipient, "gone")).await;
    assert_eq!(read_inbox(&app, &recipient).await.len(), 1);

    let auth = authorize(&app, &recipient).await;
    let uri = format!("/inbox/{}/gone", recipient.public().to_url_safe());
    let (status, body) = send(&app, authorized(Method::DELETE, &uri, &auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    assert!(read_inbox(&app, &recipient).await.is_empty());
}

#[tokio::test]
async fn test_disclose_credential_checks() {
    let app = app(1);
    let recipient = SecretKey::generate().unwrap();

    let mut unsigned = disclose_request("x", &recipient, "a");
    unsigned.headers_mut().remove(header::AUTHORIZATION);
    let (status, _) = send(&app, unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, disclose_request("forged.token", &recipient, "a")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disclose_body_checks() {
    let app = app(1);
    let credential = credential(&app).await;

    let bad_json = Request::builder()
        .method(Method::POST)
        .uri("/disclose")
        .header(header::AUTHORIZATION, format!("Bearer {}", credential))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, bad_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let oversized = Request::builder()
        .method(Method::POST)
        .uri("/disclose")
        .header(header::AUTHORIZATION, format!("Bearer {}", credential))
        .body(Body::from(vec![b'a'; MAX_BODY + 1]))
        .unwrap();
    let (status, _) = send(&app, oversized).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_register_and_list_recipients() {
    let app = app(1);
    let key = SecretKey::generate().unwrap().public();

    let register = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"name": "Dana Reporter", "publicKey": key.to_base64()}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, register).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, body) = send(&app, get("/recipients")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Value = serde_json::from_slice(&body).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Dana Reporter");

    let empty_name = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .body(Body::from(
            json!({"name": "  ", "publicKey": key.to_base64()}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, empty_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_routes() {
    let app = app(1);

    let (status, body) = send(&app, get("/_status/livez")).await;
    assert_eq!(status, StatusCode::OK);
    let livez: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(livez["status"], "ok");

    let (status, _) = send(&app, get("/_status/readyz")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/_status/version")).await;
    assert_eq!(status, StatusCode::OK);
    let version: Value = serde_json::from_slice(&body).unwrap();
    assert!(version.get("version").is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app(1);
    let (status, body) = send(&app, get("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"not found");
}
