//! Integration tests for the challenge-response handshake

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use ::common::crypto::{derive_shared_key, seal, PublicKey, SecretKey};
use ::common::rendezvous::AuthEnvelope;
use ::common::RendezvousError;
use crate::common::TestRecipient;

#[test]
fn test_end_to_end_handshake() {
    let service = common::service(3);
    let recipient = TestRecipient::new();
    let key = recipient.secret.public();

    let challenge = service.issue_challenge(&recipient.path_key()).unwrap();
    assert!(service.challenges().contains(&key, &challenge.nonce));

    // recipient side, done by hand
    let ephemeral = PublicKey::from_base64(&challenge.public_key).unwrap();
    let shared = derive_shared_key(&recipient.secret, ephemeral.as_bytes()).unwrap();
    let token = STANDARD.decode(&challenge.token).unwrap();
    let envelope = AuthEnvelope {
        nonce: challenge.nonce.clone(),
        encrypted_token: STANDARD.encode(seal(&shared, &token).unwrap()),
    };

    let authenticated = service
        .authenticate(&recipient.path_key(), &envelope.to_bearer().unwrap())
        .unwrap();
    assert_eq!(authenticated, key);
    assert!(!service.challenges().contains(&key, &challenge.nonce));
}

#[test]
fn test_replay_is_rejected() {
    let service = common::service(3);
    let recipient = TestRecipient::new();
    let auth = recipient.authorize(&service);

    assert!(service.read_inbox(&recipient.path_key(), &auth).is_ok());
    assert_eq!(
        service.read_inbox(&recipient.path_key(), &auth),
        Err(RendezvousError::NoSuchChallenge)
    );
}

#[test]
fn test_wrong_private_key_is_rejected() {
    let service = common::service(3);
    let recipient = TestRecipient::new();
    let imposter = SecretKey::generate().unwrap();

    let challenge = service.issue_challenge(&recipient.path_key()).unwrap();
    let forged = AuthEnvelope::respond(&challenge, &imposter)
        .unwrap()
        .to_bearer()
        .unwrap();

    assert_eq!(
        service.read_inbox(&recipient.path_key(), &forged),
        Err(RendezvousError::AuthenticationFailed)
    );

    // the genuine holder can still use the same challenge
    let genuine = AuthEnvelope::respond(&challenge, &recipient.secret)
        .unwrap()
        .to_bearer()
        .unwrap();
    assert!(service.read_inbox(&recipient.path_key(), &genuine).is_ok());
}

#[test]
fn test_challenge_for_other_recipient_is_rejected() {
    let service = common::service(3);
    let alice = TestRecipient::new();
    let mallory = TestRecipient::new();

    // mallory answers alice's challenge correctly, but presents it for her own inbox
    let challenge = service.issue_challenge(&alice.path_key()).unwrap();
    let auth = AuthEnvelope::respond(&challenge, &mallory.secret)
        .unwrap()
        .to_bearer()
        .unwrap();

    assert_eq!(
        service.read_inbox(&mallory.path_key(), &auth),
        Err(RendezvousError::NoSuchChallenge)
    );
    assert_eq!(
        service.read_inbox(&alice.path_key(), &auth),
        Err(RendezvousError::AuthenticationFailed)
    );
}

#[test]
fn test_standard_and_url_safe_keys_share_an_inbox() {
    let service = common::service(1);
    let recipient = TestRecipient::new();
    common::disclose(&service, &recipient, "Org", "only");

    let standard = recipient.secret.public().to_base64();
    let challenge = service.issue_challenge(&standard).unwrap();
    let auth = AuthEnvelope::respond(&challenge, &recipient.secret)
        .unwrap()
        .to_bearer()
        .unwrap();

    let entries = service.read_inbox(&recipient.path_key(), &auth).unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_unknown_nonce() {
    let service = common::service(3);
    let recipient = TestRecipient::new();
    let auth = AuthEnvelope {
        nonce: STANDARD.encode([9u8; 32]),
        encrypted_token: STANDARD.encode([0u8; 60]),
    }
    .to_bearer()
    .unwrap();

    assert_eq!(
        service.read_inbox(&recipient.path_key(), &auth),
        Err(RendezvousError::NoSuchChallenge)
    );
}
