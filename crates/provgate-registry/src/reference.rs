//! Image reference parsing.
//!
//! Supports:
//! - `registry.example.com/team/app` → repository only
//! - `registry.example.com/team/app:v1` → tagged
//! - `registry.example.com/team/app@sha256:abc...` → pinned by digest
//! - `localhost:5000/app:v1@sha256:abc...` → tag and digest

use std::fmt;

use provgate_core::{GateError, GateResult};

/// A parsed container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: Option<String>,
    /// Pinned digest (`sha256:<hex>`).
    pub digest: Option<String>,
}

impl ImageRef {
    /// Parse an image reference string.
    ///
    /// # Examples
    ///
    /// ```
    /// use provgate_registry::ImageRef;
    ///
    /// let tagged = ImageRef::parse("registry.example.com/app:v1").unwrap();
    /// assert_eq!(tagged.tag.as_deref(), Some("v1"));
    ///
    /// let pinned = ImageRef::parse("registry.example.com/app@sha256:abc123").unwrap();
    /// assert_eq!(pinned.digest_hex(), Some("abc123"));
    ///
    /// // A registry port is not a tag
    /// let ported = ImageRef::parse("localhost:5000/app").unwrap();
    /// assert!(ported.tag.is_none());
    /// ```
    pub fn parse(reference: &str) -> GateResult<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(GateError::MissingInput {
                what: "image reference".to_string(),
            });
        }

        let invalid = |reason: &str| GateError::ImageVerification {
            image_ref: reference.to_string(),
            reason: reason.to_string(),
        };

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                let Some(hex) = digest.strip_prefix("sha256:") else {
                    return Err(invalid("pinned digest must start with 'sha256:'"));
                };
                if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid("pinned digest must be hex encoded"));
                }
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A ':' after the last '/' separates the tag; earlier ones are ports.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_slash..].rfind(':') {
            Some(colon) => {
                let split = last_slash + colon;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        if repository.is_empty() {
            return Err(invalid("repository is required"));
        }
        if tag.as_deref() == Some("") {
            return Err(invalid("tag must not be empty"));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Hex part of the pinned digest.
    pub fn digest_hex(&self) -> Option<&str> {
        self.digest.as_deref().and_then(|d| d.strip_prefix("sha256:"))
    }

    /// File name of this image in an attestation store.
    pub fn store_file_name(&self) -> String {
        let escaped: String = self
            .to_string()
            .chars()
            .map(|c| if matches!(c, '/' | ':' | '@') { '_' } else { c })
            .collect();
        format!("{}.jsonl", escaped)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
