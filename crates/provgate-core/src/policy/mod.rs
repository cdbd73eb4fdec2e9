//! Policy evaluation orchestration.
//!
//! ```text
//! Resolve ─┬─ FetchSources ─┐
//!          ├─ FetchData ────┼─ LoadEngine ─ Check ─ Format
//!          └─ BuildInputs ──┘
//! ```
//!
//! Every stage is fail-fast: the first error ends the evaluation and no
//! partial results are returned.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use crate::attestation::AttestationSignature;
use crate::context::Context;
use crate::engine::{EngineLoader, EvaluationResult, EVALUATION_ENTRYPOINT};
use crate::error::GateResult;
use crate::output::{OutputOptions, Outputter};

pub mod input;
pub mod name;
pub mod sources;
pub mod spec;

pub use input::{build_inputs, input_name};
pub use name::PolicyName;
pub use sources::{fetch_policy_data, fetch_rule_sources};
pub use spec::{
    compute_digest, PolicyBundle, PolicyConfigStore, PolicySpec, SourceFetcher, SourceLocation,
};

/// Collaborators an evaluator needs.
#[derive(Clone)]
pub struct EvaluatorDeps {
    pub config_store: Arc<dyn PolicyConfigStore>,
    pub sources: Arc<dyn SourceFetcher>,
    pub engine_loader: Arc<dyn EngineLoader>,
    pub output: OutputOptions,
}

/// Evaluates attestations against one named policy.
///
/// Holds no per-evaluation state, so a single evaluator may serve
/// concurrent calls.
#[derive(Clone)]
pub struct PolicyEvaluator {
    policy_name: PolicyName,
    config_store: Arc<dyn PolicyConfigStore>,
    sources: Arc<dyn SourceFetcher>,
    engine_loader: Arc<dyn EngineLoader>,
    outputter: Outputter,
}

impl PolicyEvaluator {
    /// Fails with `MissingInput` when `policy_configuration` is empty.
    pub fn new(policy_configuration: &str, deps: EvaluatorDeps) -> GateResult<Self> {
        let policy_name = PolicyName::parse(policy_configuration)?;
        Ok(Self {
            policy_name,
            config_store: deps.config_store,
            sources: deps.sources,
            engine_loader: deps.engine_loader,
            outputter: Outputter::new(deps.output),
        })
    }

    pub fn policy_name(&self) -> &PolicyName {
        &self.policy_name
    }

    /// Look up the policy spec this evaluator is bound to.
    pub async fn policy_spec(&self, ctx: &Context) -> GateResult<PolicySpec> {
        ctx.run(self.config_store.fetch_policy_spec(ctx, &self.policy_name))
            .await
    }

    /// Evaluate `signatures` and return per-input results in engine order.
    pub async fn evaluate(
        &self,
        ctx: &Context,
        signatures: &[AttestationSignature],
    ) -> GateResult<Vec<EvaluationResult>> {
        let spec = self.policy_spec(ctx).await?;
        self.evaluate_with_spec(ctx, &spec, signatures).await
    }

    /// Evaluate against a spec the caller already resolved with
    /// [`Self::policy_spec`].
    pub async fn evaluate_with_spec(
        &self,
        ctx: &Context,
        spec: &PolicySpec,
        signatures: &[AttestationSignature],
    ) -> GateResult<Vec<EvaluationResult>> {
        debug!(
            policy = %self.policy_name,
            sources = spec.sources.len(),
            "resolved policy spec"
        );

        let (rule_sources, data, inputs) = tokio::try_join!(
            fetch_rule_sources(ctx, self.sources.as_ref(), spec),
            fetch_policy_data(ctx, self.sources.as_ref(), spec),
            ctx.run(async { build_inputs(signatures) }),
        )?;

        let engine = ctx
            .run(self.engine_loader.load(ctx, &rule_sources, data))
            .await?;

        let results = ctx
            .run(engine.check(ctx, &inputs, EVALUATION_ENTRYPOINT))
            .await?;

        info!(
            policy = %self.policy_name,
            inputs = inputs.len(),
            results = results.len(),
            "policy evaluation complete"
        );
        Ok(results)
    }

    /// Serialize `results` with the configured output options.
    pub fn output(&self, results: &[EvaluationResult], out: &mut dyn Write) -> GateResult<()> {
        self.outputter.write(results, out)
    }
}
