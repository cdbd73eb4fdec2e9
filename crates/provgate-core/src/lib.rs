//! Supply-chain compliance core for provgate.
//!
//! This crate holds the two pipelines that run against the verified
//! attestations of a container image:
//!
//! - **Sign-off resolution**: finds the source revision an attestation was
//!   built from and turns its `Signed-off-by:` trailer into a [`SignOff`].
//! - **Policy evaluation**: resolves a named policy into rule and data
//!   bundles, builds one input document per attestation and drives a rule
//!   engine over them.
//!
//! All I/O goes through collaborator traits ([`AttestationFetcher`],
//! [`CommitFetcher`], [`PolicyConfigStore`], [`SourceFetcher`],
//! [`EngineLoader`]); concrete adapters live in `provgate-registry` and
//! `provgate-rules`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use provgate_core::{
//!     Context, EngineLoader, EvaluatorDeps, OutputOptions, PolicyConfigStore, PolicyEvaluator,
//!     SourceFetcher, ValidatedImage,
//! };
//!
//! # async fn example(
//! #     config_store: Arc<dyn PolicyConfigStore>,
//! #     sources: Arc<dyn SourceFetcher>,
//! #     engine_loader: Arc<dyn EngineLoader>,
//! #     image: ValidatedImage,
//! # ) -> provgate_core::GateResult<()> {
//! let evaluator = PolicyEvaluator::new(
//!     "tenant/release",
//!     EvaluatorDeps {
//!         config_store,
//!         sources,
//!         engine_loader,
//!         output: OutputOptions::default(),
//!     },
//! )?;
//! let results = evaluator
//!     .evaluate(&Context::background(), &image.attestations)
//!     .await?;
//! evaluator.output(&results, &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod attestation;
pub mod context;
pub mod engine;
pub mod error;
pub mod output;
pub mod policy;
pub mod signoff;

#[cfg(test)]
pub(crate) mod testing;

pub use attestation::{
    Attestation, AttestationFetcher, AttestationSignature, Material, ValidatedImage,
    COMMIT_DIGEST_ALGORITHM, PAYLOAD_TYPE_IN_TOTO,
};
pub use context::{CancelHandle, Context};
pub use engine::{
    CheckResult, EngineLoader, EvaluationResult, InputDocument, Outcome, RuleEngine,
    EVALUATION_ENTRYPOINT,
};
pub use error::{GateError, GateResult};
pub use output::{OutputFormat, OutputOptions, Outputter};
pub use policy::{
    EvaluatorDeps, PolicyBundle, PolicyConfigStore, PolicyEvaluator, PolicyName, PolicySpec,
    SourceFetcher, SourceLocation,
};
pub use signoff::{
    collect_sign_offs, CommitFetcher, CommitMetadata, GitSource, Identity, JiraSource, SignOff,
    SignOffKind, SignOffResolver, SignOffSource,
};
