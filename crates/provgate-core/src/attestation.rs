//! Attestation model and material extraction.
//!
//! Attestations arrive as verified DSSE payloads carrying an in-toto
//! statement. Only the parts the sign-off resolver needs are modeled
//! strictly; everything else stays available as raw JSON for the rule
//! engine.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{GateError, GateResult};

/// Digest algorithm recognized for source revisions.
pub const COMMIT_DIGEST_ALGORITHM: &str = "sha1";

/// Payload type of in-toto statements inside DSSE envelopes.
pub const PAYLOAD_TYPE_IN_TOTO: &str = "application/vnd.in-toto+json";

/// One verified attestation signature for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationSignature {
    /// DSSE payload type.
    pub payload_type: String,

    /// Decoded payload bytes (the in-toto statement).
    pub payload: Vec<u8>,

    /// Key ID of the signature that verified.
    pub key_id: Option<String>,
}

impl AttestationSignature {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload_type: PAYLOAD_TYPE_IN_TOTO.to_string(),
            payload: payload.into(),
            key_id: None,
        }
    }

    /// Parse the payload as an attestation statement.
    ///
    /// `index` identifies the signature in error messages.
    pub fn attestation(&self, index: usize) -> GateResult<Attestation> {
        serde_json::from_slice(&self.payload).map_err(|e| GateError::InputBuild {
            index,
            reason: format!("invalid attestation statement: {}", e),
        })
    }
}

/// An image whose attestations passed signature verification.
#[derive(Debug, Clone, Default)]
pub struct ValidatedImage {
    /// Image reference as given by the caller.
    pub reference: String,

    /// Verified attestation signatures, in registry order.
    pub attestations: Vec<AttestationSignature>,
}

/// Fetches and verifies the attestations of an image.
#[async_trait]
pub trait AttestationFetcher: Send + Sync {
    /// `identity` optionally restricts which signer is accepted.
    async fn fetch_attested_image(
        &self,
        ctx: &Context,
        image_ref: &str,
        public_key: &str,
        identity: Option<&str>,
    ) -> GateResult<ValidatedImage>;
}

/// In-toto statement, reduced to what provenance resolution reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    #[serde(rename = "predicateType", default)]
    pub predicate_type: String,

    #[serde(default)]
    pub subject: Vec<Subject>,

    #[serde(default)]
    pub predicate: Predicate,
}

/// Statement subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub digest: BTreeMap<String, String>,
}

/// Provenance predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub materials: Vec<Material>,
}

/// Build input recorded in the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,

    /// Algorithm name -> hex digest. Absent and empty are equivalent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub digest: BTreeMap<String, String>,
}

impl Material {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            digest: BTreeMap::new(),
        }
    }

    pub fn with_digest(mut self, algorithm: &str, value: impl Into<String>) -> Self {
        self.digest.insert(algorithm.to_string(), value.into());
        self
    }

    fn identifies_revision(&self) -> bool {
        !self.uri.is_empty() && self.digest.contains_key(COMMIT_DIGEST_ALGORITHM)
    }
}

impl Attestation {
    /// Attestation with the given materials and nothing else.
    pub fn with_materials(materials: Vec<Material>) -> Self {
        Self {
            predicate: Predicate { materials },
            ..Self::default()
        }
    }

    /// First material with a non-empty URI and a `sha1` digest.
    ///
    /// Returns the empty material when none qualifies, so callers can still
    /// report the (empty) values.
    pub fn build_material(&self) -> Material {
        self.predicate
            .materials
            .iter()
            .find(|m| m.identifies_revision())
            .cloned()
            .unwrap_or_default()
    }

    /// Commit sha of the build source, or `""`.
    pub fn build_commit_sha(&self) -> String {
        self.build_material()
            .digest
            .get(COMMIT_DIGEST_ALGORITHM)
            .cloned()
            .unwrap_or_default()
    }

    /// Repository URI of the build source, or `""`.
    pub fn build_scm(&self) -> String {
        self.build_material().uri
    }

    /// Whether any subject carries `algorithm:value` as a digest.
    pub fn has_subject_digest(&self, algorithm: &str, value: &str) -> bool {
        self.subject
            .iter()
            .any(|s| s.digest.get(algorithm).is_some_and(|d| d == value))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
