//! Wire types and adapter configuration.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DSSE envelope structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsseEnvelope {
    /// Payload type (e.g., "application/vnd.in-toto+json").
    #[serde(rename = "payloadType")]
    pub payload_type: String,

    /// Base64-encoded payload.
    pub payload: String,

    /// Signatures.
    pub signatures: Vec<DsseSignature>,
}

/// DSSE signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsseSignature {
    /// Key ID.
    #[serde(rename = "keyid", default)]
    pub key_id: String,

    /// Base64-encoded signature.
    #[serde(rename = "sig")]
    pub signature: String,
}

/// Response from GET /repos/{owner}/{repo}/commits/{sha}.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitResponse {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitDetail {
    pub author: CommitAuthor,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitAuthor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding `<image>.jsonl` attestation files.
    #[serde(default = "default_attestation_store")]
    pub attestation_store: PathBuf,

    /// Directory holding `<namespace>/<name>.yaml` policy specs.
    #[serde(default = "default_policy_store")]
    pub policy_store: PathBuf,

    /// Base URL of the forge REST API.
    #[serde(default = "default_forge_api_url")]
    pub forge_api_url: String,

    /// Forge token.
    #[serde(default)]
    pub forge_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_attestation_store() -> PathBuf {
    PathBuf::from("attestations")
}

fn default_policy_store() -> PathBuf {
    PathBuf::from("policies")
}

fn default_forge_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            attestation_store: default_attestation_store(),
            policy_store: default_policy_store(),
            forge_api_url: default_forge_api_url(),
            forge_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PROVGATE_ATTESTATION_STORE` | Attestation directory |
    /// | `PROVGATE_POLICY_STORE` | Policy directory |
    /// | `PROVGATE_FORGE_API_URL` | Forge API base URL |
    /// | `PROVGATE_FORGE_TOKEN` | Forge token |
    /// | `PROVGATE_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            attestation_store: std::env::var("PROVGATE_ATTESTATION_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_attestation_store()),
            policy_store: std::env::var("PROVGATE_POLICY_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_policy_store()),
            forge_api_url: std::env::var("PROVGATE_FORGE_API_URL")
                .unwrap_or_else(|_| default_forge_api_url()),
            forge_token: std::env::var("PROVGATE_FORGE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("PROVGATE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    pub fn with_attestation_store(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attestation_store = dir.into();
        self
    }

    pub fn with_policy_store(mut self, dir: impl Into<PathBuf>) -> Self {
        self.policy_store = dir.into();
        self
    }

    /// Set the forge API base URL.
    pub fn with_forge_api_url(mut self, url: impl Into<String>) -> Self {
        self.forge_api_url = url.into();
        self
    }

    /// Set the forge token.
    pub fn with_forge_token(mut self, token: impl Into<String>) -> Self {
        self.forge_token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
