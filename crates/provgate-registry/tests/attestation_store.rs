//! Integration tests for the file-backed attestation store.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey};
use pkcs8::{EncodePublicKey, LineEnding};
use provgate_core::{AttestationFetcher, Context, GateError, PAYLOAD_TYPE_IN_TOTO};
use provgate_registry::{build_pae, AttestationStore, DsseEnvelope, DsseSignature, ImageRef};

const IMAGE: &str = "registry.example.com/acme/widget:v1";
const DIGEST: &str = "4b3a1f0c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b7c6d5e4f3a";

fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn public_pem(key: &SigningKey) -> String {
    key.verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("encode public key")
}

fn statement(subject_digest: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "_type": "https://in-toto.io/Statement/v0.1",
        "predicateType": "https://slsa.dev/provenance/v0.2",
        "subject": [{"name": "registry.example.com/acme/widget", "digest": {"sha256": subject_digest}}],
        "predicate": {
            "materials": [{"uri": "https://github.com/acme/widget.git", "digest": {"sha1": "abc123"}}]
        }
    }))
    .unwrap()
}

fn envelope_line(key: &SigningKey, key_id: &str, payload: &[u8]) -> String {
    let pae = build_pae(PAYLOAD_TYPE_IN_TOTO, payload);
    let envelope = DsseEnvelope {
        payload_type: PAYLOAD_TYPE_IN_TOTO.to_string(),
        payload: BASE64.encode(payload),
        signatures: vec![DsseSignature {
            key_id: key_id.to_string(),
            signature: BASE64.encode(key.sign(&pae).to_bytes()),
        }],
    };
    serde_json::to_string(&envelope).unwrap()
}

fn write_store(image: &str, lines: &[String]) -> (tempfile::TempDir, AttestationStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = AttestationStore::new(dir.path());
    let path = store.path_for(&ImageRef::parse(image).unwrap());
    std::fs::write(path, lines.join("\n")).unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_fetch_verified_attestations() {
    let key = signing_key(7);
    let lines = vec![
        envelope_line(&key, "builder", &statement(DIGEST)),
        envelope_line(&key, "builder", &statement(DIGEST)),
    ];
    let (_dir, store) = write_store(IMAGE, &lines);

    let image = store
        .fetch_attested_image(&Context::background(), IMAGE, &public_pem(&key), None)
        .await
        .expect("fetch failed");

    assert_eq!(image.reference, IMAGE);
    assert_eq!(image.attestations.len(), 2);
    assert_eq!(image.attestations[0].key_id.as_deref(), Some("builder"));
    let att = image.attestations[0].attestation(0).unwrap();
    assert_eq!(att.build_commit_sha(), "abc123");
}

#[tokio::test]
async fn test_wrong_key_fails_whole_fetch() {
    let lines = vec![
        envelope_line(&signing_key(7), "builder", &statement(DIGEST)),
        envelope_line(&signing_key(8), "intruder", &statement(DIGEST)),
    ];
    let (_dir, store) = write_store(IMAGE, &lines);

    let result = store
        .fetch_attested_image(
            &Context::background(),
            IMAGE,
            &public_pem(&signing_key(7)),
            None,
        )
        .await;

    match result {
        Err(GateError::ImageVerification { image_ref, reason }) => {
            assert_eq!(image_ref, IMAGE);
            assert!(reason.starts_with("line 2"), "{reason}");
        }
        other => panic!("expected ImageVerification, got {other:?}"),
    }
}

#[tokio::test]
async fn test_identity_restricts_signer() {
    let key = signing_key(7);
    let lines = vec![envelope_line(&key, "builder", &statement(DIGEST))];
    let (_dir, store) = write_store(IMAGE, &lines);
    let ctx = Context::background();

    assert!(store
        .fetch_attested_image(&ctx, IMAGE, &public_pem(&key), Some("builder"))
        .await
        .is_ok());
    assert!(matches!(
        store
            .fetch_attested_image(&ctx, IMAGE, &public_pem(&key), Some("someone-else"))
            .await,
        Err(GateError::ImageVerification { .. })
    ));
}

#[tokio::test]
async fn test_pinned_digest_must_match_subject() {
    let key = signing_key(7);
    let pinned = format!("registry.example.com/acme/widget@sha256:{DIGEST}");
    let other = format!("registry.example.com/acme/widget@sha256:{}", "a".repeat(64));

    let (_dir, store) = write_store(&pinned, &[envelope_line(&key, "k", &statement(DIGEST))]);
    assert!(store
        .fetch_attested_image(&Context::background(), &pinned, &public_pem(&key), None)
        .await
        .is_ok());

    let (_dir2, store) = write_store(&other, &[envelope_line(&key, "k", &statement(DIGEST))]);
    let err = store
        .fetch_attested_image(&Context::background(), &other, &public_pem(&key), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not name subject"), "{err}");
}

#[tokio::test]
async fn test_missing_and_empty_stores() {
    let key = signing_key(7);
    let dir = tempfile::tempdir().unwrap();
    let store = AttestationStore::new(dir.path());
    let ctx = Context::background();

    assert!(matches!(
        store
            .fetch_attested_image(&ctx, IMAGE, &public_pem(&key), None)
            .await,
        Err(GateError::ImageVerification { .. })
    ));

    let (_dir, store) = write_store(IMAGE, &[String::new()]);
    let err = store
        .fetch_attested_image(&ctx, IMAGE, &public_pem(&key), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no attestations"), "{err}");
}

#[tokio::test]
async fn test_invalid_public_key() {
    let (_dir, store) = write_store(IMAGE, &[envelope_line(&signing_key(7), "k", b"{}")]);
    let err = store
        .fetch_attested_image(&Context::background(), IMAGE, "garbage", None)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
}
