//! File-backed attestation store.
//!
//! Layout: `<dir>/<escaped image ref>.jsonl`, one DSSE envelope per line.
//! See [`ImageRef::store_file_name`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use provgate_core::{
    AttestationFetcher, AttestationSignature, Context, GateError, GateResult, ValidatedImage,
    PAYLOAD_TYPE_IN_TOTO,
};

use crate::dsse::{parse_public_key, verify_envelope};
use crate::reference::ImageRef;
use crate::types::DsseEnvelope;

/// Attestations kept on the local filesystem.
#[derive(Debug, Clone)]
pub struct AttestationStore {
    dir: PathBuf,
}

impl AttestationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the attestation file for `image`.
    pub fn path_for(&self, image: &ImageRef) -> PathBuf {
        self.dir.join(image.store_file_name())
    }

    async fn load(
        &self,
        image: &ImageRef,
        public_key: &str,
        identity: Option<&str>,
    ) -> GateResult<ValidatedImage> {
        let image_ref = image.to_string();
        let failed = |reason: String| GateError::ImageVerification {
            image_ref: image_ref.clone(),
            reason,
        };

        let key = parse_public_key(public_key).map_err(&failed)?;

        let path = self.path_for(image);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            failed(format!(
                "failed to read attestations from {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut attestations = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let envelope: DsseEnvelope = serde_json::from_str(line)
                .map_err(|e| failed(format!("line {}: invalid DSSE envelope: {}", line_no + 1, e)))?;

            let verified = verify_envelope(&envelope, &key, identity)
                .map_err(|reason| failed(format!("line {}: {}", line_no + 1, reason)))?;

            if let Some(hex) = image.digest_hex() {
                check_subject(&verified.payload, hex)
                    .map_err(|reason| failed(format!("line {}: {}", line_no + 1, reason)))?;
            }

            debug!(line = line_no + 1, key_id = ?verified.key_id, "verified attestation");
            attestations.push(AttestationSignature {
                payload_type: PAYLOAD_TYPE_IN_TOTO.to_string(),
                payload: verified.payload,
                key_id: verified.key_id,
            });
        }

        if attestations.is_empty() {
            warn!(image = %image_ref, "no attestations found");
            return Err(failed("no attestations".to_string()));
        }

        info!(image = %image_ref, count = attestations.len(), "attestations verified");
        Ok(ValidatedImage {
            reference: image_ref,
            attestations,
        })
    }
}

fn check_subject(payload: &[u8], digest_hex: &str) -> Result<(), String> {
    let signature = AttestationSignature::new(payload.to_vec());
    let statement = signature.attestation(0).map_err(|e| e.to_string())?;
    if statement.has_subject_digest("sha256", digest_hex) {
        Ok(())
    } else {
        Err(format!("statement does not name subject sha256:{}", digest_hex))
    }
}

#[async_trait]
impl AttestationFetcher for AttestationStore {
    async fn fetch_attested_image(
        &self,
        ctx: &Context,
        image_ref: &str,
        public_key: &str,
        identity: Option<&str>,
    ) -> GateResult<ValidatedImage> {
        let image = ImageRef::parse(image_ref)?;
        ctx.run(self.load(&image, public_key, identity)).await
    }
}
