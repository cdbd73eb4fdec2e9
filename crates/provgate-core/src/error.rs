//! Error types shared by the sign-off and policy pipelines.

/// Gate errors.
///
/// Every pipeline stage returns the first error it encounters; nothing in
/// this crate retries or recovers locally.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A required identifier was empty.
    #[error("missing input: {what} is required")]
    MissingInput { what: String },

    /// No material in the attestation identifies a source revision.
    #[error("there is no authorization source in attestation. sha: {sha}, url: {uri}")]
    NoAuthorizationSource { sha: String, uri: String },

    /// Named policy resource does not exist.
    #[error("policy not found: {name}")]
    ResourceNotFound { name: String },

    /// Policy resource exists but could not be parsed or is incomplete.
    #[error("invalid policy {name}: {reason}")]
    InvalidPolicySpec { name: String, reason: String },

    /// Rule or data source unreachable or malformed.
    #[error("failed to fetch policy source {location}: {reason}")]
    SourceFetch { location: String, reason: String },

    /// Attestation payload could not be turned into an input document.
    #[error("failed to build input from attestation #{index}: {reason}")]
    InputBuild { index: usize, reason: String },

    /// Rule bundles failed to compile.
    #[error("failed to load rule engine: {reason}")]
    EngineLoad { reason: String },

    /// Rule evaluation failed at runtime.
    #[error("rule evaluation failed: {reason}")]
    EngineCheck { reason: String },

    /// Image attestations could not be fetched or verified.
    #[error("image verification failed for {image_ref}: {reason}")]
    ImageVerification { image_ref: String, reason: String },

    /// Commit metadata could not be fetched.
    #[error("failed to fetch commit {sha} from {repo_url}: {reason}")]
    CommitFetch {
        repo_url: String,
        sha: String,
        reason: String,
    },

    /// Results could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Cancellation or deadline observed.
    #[error("operation canceled")]
    Canceled,
}

impl GateError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input / config issues
            Self::MissingInput { .. } => 1,
            Self::InvalidPolicySpec { .. } => 1,

            // Nothing to authorize against; 2 stays with clap usage errors
            Self::NoAuthorizationSource { .. } => 7,

            // Policy resolution
            Self::ResourceNotFound { .. } => 3,

            // Verification
            Self::ImageVerification { .. } => 4,
            Self::InputBuild { .. } => 4,

            // Network
            Self::SourceFetch { .. } => 5,
            Self::CommitFetch { .. } => 5,

            // Engine
            Self::EngineLoad { .. } => 6,
            Self::EngineCheck { .. } => 6,
            Self::Serialization { .. } => 6,

            Self::Canceled => 130,
        }
    }

    pub(crate) fn missing(what: &str) -> Self {
        Self::MissingInput {
            what: what.to_string(),
        }
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_authorization_source_message_carries_values() {
        let err = GateError::NoAuthorizationSource {
            sha: String::new(),
            uri: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "there is no authorization source in attestation. sha: , url: "
        );
    }

    #[test]
    fn test_exit_codes_are_non_zero() {
        let errors = [
            GateError::missing("policy name"),
            GateError::ResourceNotFound { name: "x".into() },
            GateError::EngineLoad { reason: "x".into() },
            GateError::Canceled,
        ];
        for err in errors {
            assert_ne!(err.exit_code(), 0, "{err}");
        }
    }

    #[test]
    fn test_no_authorization_source_has_own_exit_code() {
        let err = GateError::NoAuthorizationSource {
            sha: String::new(),
            uri: String::new(),
        };
        assert_eq!(err.exit_code(), 7);
    }
}
