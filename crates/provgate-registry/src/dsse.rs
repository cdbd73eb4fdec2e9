//! DSSE envelope verification.
//!
//! PAE building and Ed25519 signature checks only; which envelopes an
//! image needs is decided by the attestation store.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use pkcs8::DecodePublicKey;

use provgate_core::PAYLOAD_TYPE_IN_TOTO;

use crate::types::DsseEnvelope;

/// Pre-authentication encoding (DSSEv1) of `payload`.
pub fn build_pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let type_len = payload_type.len().to_string();
    let payload_len = payload.len().to_string();

    let mut pae = Vec::new();
    pae.extend_from_slice(b"DSSEv1 ");
    pae.extend_from_slice(type_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_type.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload);
    pae
}

/// Parse an Ed25519 SPKI public key in PEM form.
pub fn parse_public_key(pem: &str) -> Result<VerifyingKey, String> {
    VerifyingKey::from_public_key_pem(pem.trim())
        .map_err(|e| format!("invalid Ed25519 public key: {}", e))
}

/// Envelope payload and the key id that verified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    pub payload: Vec<u8>,
    pub key_id: Option<String>,
}

/// Verify `envelope` against `key`.
///
/// With `identity` set, only signatures carrying that key id are tried.
/// Errors are human readable reasons.
pub fn verify_envelope(
    envelope: &DsseEnvelope,
    key: &VerifyingKey,
    identity: Option<&str>,
) -> Result<VerifiedPayload, String> {
    if envelope.payload_type != PAYLOAD_TYPE_IN_TOTO {
        return Err(format!(
            "payload type mismatch: expected {}, got {}",
            PAYLOAD_TYPE_IN_TOTO, envelope.payload_type
        ));
    }

    let payload = BASE64
        .decode(&envelope.payload)
        .map_err(|e| format!("invalid base64 payload: {}", e))?;

    let candidates: Vec<_> = envelope
        .signatures
        .iter()
        .filter(|sig| identity.is_none_or(|id| sig.key_id == id))
        .collect();

    if candidates.is_empty() {
        return Err(match identity {
            Some(id) => format!("no signature with key id {}", id),
            None => "no signatures in envelope".to_string(),
        });
    }

    let pae = build_pae(&envelope.payload_type, &payload);

    let mut last_error = None;
    for sig in candidates {
        match verify_single_signature(&pae, &sig.signature, key) {
            Ok(()) => {
                return Ok(VerifiedPayload {
                    payload,
                    key_id: Some(sig.key_id.clone()).filter(|k| !k.is_empty()),
                })
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| "no valid signatures".to_string()))
}

fn verify_single_signature(
    pae: &[u8],
    signature_b64: &str,
    key: &VerifyingKey,
) -> Result<(), String> {
    let signature_bytes = BASE64
        .decode(signature_b64)
        .map_err(|e| format!("invalid base64 signature: {}", e))?;

    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|e| format!("invalid signature bytes: {}", e))?;

    key.verify(pae, &signature)
        .map_err(|_| "ed25519 verification failed".to_string())
}
