//! Policy specification and the collaborators that resolve it.
//!
//! Source locations support:
//! - `./rules.yaml`, `/abs/rules.yaml`, `rules.yaml` → local file
//! - `file:///abs/rules.yaml` → local file
//! - `https://host/rules.yaml`, `http://…` → remote fetch

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::context::Context;
use crate::error::{GateError, GateResult};

use super::name::PolicyName;

/// Resolved description of a named policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    #[serde(default)]
    pub description: Option<String>,

    /// Rule bundle locations, evaluated in order.
    pub sources: Vec<String>,

    /// Data bundle location.
    pub data: String,

    /// PEM public key used to verify attestations when none is given.
    #[serde(default, rename = "publicKey", alias = "public_key")]
    pub public_key: Option<String>,
}

impl PolicySpec {
    /// Parse a YAML (or JSON) policy document.
    pub fn from_yaml(name: &PolicyName, content: &str) -> GateResult<Self> {
        let spec: Self = serde_yaml::from_str(content).map_err(|e| GateError::InvalidPolicySpec {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        spec.validate(name)?;
        Ok(spec)
    }

    /// Check that every declared location parses.
    pub fn validate(&self, name: &PolicyName) -> GateResult<()> {
        let invalid = |reason: String| GateError::InvalidPolicySpec {
            name: name.to_string(),
            reason,
        };

        if self.sources.is_empty() {
            return Err(invalid("at least one rule source is required".to_string()));
        }
        for source in &self.sources {
            SourceLocation::parse(source).map_err(|e| invalid(e.to_string()))?;
        }
        SourceLocation::parse(&self.data).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    pub fn source_locations(&self) -> GateResult<Vec<SourceLocation>> {
        self.sources.iter().map(|s| SourceLocation::parse(s)).collect()
    }

    pub fn data_location(&self) -> GateResult<SourceLocation> {
        SourceLocation::parse(&self.data)
    }
}

/// Where a rule or data bundle lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    File(PathBuf),
    Http(Url),
}

impl SourceLocation {
    pub fn parse(location: &str) -> GateResult<Self> {
        let location = location.trim();
        let invalid = |reason: &str| GateError::SourceFetch {
            location: location.to_string(),
            reason: reason.to_string(),
        };

        if location.is_empty() {
            return Err(invalid("empty source location"));
        }

        if location.starts_with("https://") || location.starts_with("http://") {
            let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
            return Ok(Self::Http(url));
        }

        if location.starts_with("file://") {
            let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
            let path = url
                .to_file_path()
                .map_err(|_| invalid("file URL must be an absolute local path"))?;
            return Ok(Self::File(path));
        }

        if let Some((scheme, _)) = location.split_once("://") {
            return Err(invalid(&format!("unsupported scheme '{}'", scheme)));
        }

        Ok(Self::File(PathBuf::from(location)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Fetched contents of one source. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyBundle {
    pub location: SourceLocation,
    pub content: String,
    /// `sha256:<hex>` of the content.
    pub digest: String,
}

impl PolicyBundle {
    pub fn new(location: SourceLocation, content: impl Into<String>) -> Self {
        let content = content.into();
        let digest = compute_digest(&content);
        Self {
            location,
            content,
            digest,
        }
    }
}

/// `sha256:<hex>` of `content`.
pub fn compute_digest(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    format!("sha256:{}", hex::encode(hash))
}

/// Looks up a policy specification by name.
#[async_trait]
pub trait PolicyConfigStore: Send + Sync {
    async fn fetch_policy_spec(&self, ctx: &Context, name: &PolicyName) -> GateResult<PolicySpec>;
}

/// Retrieves the content of a rule or data location.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, ctx: &Context, location: &SourceLocation) -> GateResult<PolicyBundle>;
}
