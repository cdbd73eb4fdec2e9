//! Concrete collaborators for provgate.
//!
//! This crate implements the I/O side of the core traits:
//!
//! - [`AttestationStore`]: DSSE envelopes on disk, verified with an Ed25519 key
//! - [`FilePolicyStore`]: policy specs under `<root>/<namespace>/<name>.yaml`
//! - [`SourceClient`]: rule and data bundles from files or HTTP(S)
//! - [`GitHubCommitFetcher`]: commit metadata from a GitHub-compatible API
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use provgate_core::{CommitFetcher, SignOffResolver};
//! use provgate_registry::{GitHubCommitFetcher, RegistryConfig};
//!
//! # fn example() -> provgate_core::GateResult<()> {
//! let config = RegistryConfig::from_env();
//! let commits: Arc<dyn CommitFetcher> = Arc::new(GitHubCommitFetcher::new(&config)?);
//! let resolver = SignOffResolver::new(commits);
//! # let _ = resolver;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `PROVGATE_ATTESTATION_STORE` | Attestation directory (default: `attestations`) |
//! | `PROVGATE_POLICY_STORE` | Policy directory (default: `policies`) |
//! | `PROVGATE_FORGE_API_URL` | Forge API base URL (default: `https://api.github.com`) |
//! | `PROVGATE_FORGE_TOKEN` | Forge token |
//! | `PROVGATE_TIMEOUT` | Request timeout in seconds (default: 30) |

pub mod dsse;
pub mod forge;
mod http;
pub mod policy_store;
pub mod reference;
pub mod sources;
pub mod store;
pub mod types;

pub use dsse::{build_pae, parse_public_key, verify_envelope, VerifiedPayload};
pub use forge::GitHubCommitFetcher;
pub use http::REGISTRY_USER_AGENT;
pub use policy_store::FilePolicyStore;
pub use reference::ImageRef;
pub use sources::SourceClient;
pub use store::AttestationStore;
pub use types::{DsseEnvelope, DsseSignature, RegistryConfig};
