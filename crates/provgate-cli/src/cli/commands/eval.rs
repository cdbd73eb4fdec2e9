use std::sync::Arc;

use provgate_core::{
    AttestationFetcher, EvaluatorDeps, GateError, OutputOptions, PolicyEvaluator, PolicySpec,
};
use provgate_registry::{AttestationStore, FilePolicyStore, RegistryConfig, SourceClient};
use provgate_rules::BundleEngineLoader;
use tracing::{debug, info};

use crate::cli::args::EvalArgs;
use crate::cli::helpers::{command_context, read_public_key};
use crate::exit_codes::SUCCESS;

pub async fn run(args: EvalArgs) -> anyhow::Result<i32> {
    let config = RegistryConfig::from_env()
        .with_attestation_store(&args.image.attestation_store)
        .with_policy_store(&args.policy_store)
        .with_timeout_secs(args.image.timeout);

    let output = OutputOptions::default()
        .with_format(args.output)
        .with_color(args.color)
        .with_suppress_exceptions(args.suppress_exceptions)
        .with_assertion_messages(args.show_assertion_messages);

    let deps = EvaluatorDeps {
        config_store: Arc::new(FilePolicyStore::new(&config.policy_store)),
        sources: Arc::new(SourceClient::new(&config)?),
        engine_loader: Arc::new(BundleEngineLoader::new()),
        output,
    };
    let evaluator = PolicyEvaluator::new(&args.policy, deps)?;
    let ctx = command_context(args.image.timeout);

    let spec = evaluator.policy_spec(&ctx).await?;
    let public_key = resolve_public_key(&args, &evaluator, &spec)?;

    let store = AttestationStore::new(&config.attestation_store);
    let image = store
        .fetch_attested_image(
            &ctx,
            &args.image.image_ref,
            &public_key,
            args.image.identity.as_deref(),
        )
        .await?;

    let results = evaluator
        .evaluate_with_spec(&ctx, &spec, &image.attestations)
        .await?;
    info!(
        policy = %evaluator.policy_name(),
        image = %image.reference,
        inputs = results.len(),
        "evaluation finished"
    );

    let mut out = std::io::stdout().lock();
    evaluator.output(&results, &mut out)?;
    Ok(SUCCESS)
}

/// `--public-key` wins; otherwise the policy's own `publicKey`.
fn resolve_public_key(
    args: &EvalArgs,
    evaluator: &PolicyEvaluator,
    spec: &PolicySpec,
) -> anyhow::Result<String> {
    if let Some(path) = &args.public_key {
        return read_public_key(path);
    }

    match spec.public_key.as_deref().filter(|key| !key.trim().is_empty()) {
        Some(key) => {
            debug!(policy = %evaluator.policy_name(), "using public key from policy");
            Ok(key.to_string())
        }
        None => Err(GateError::MissingInput {
            what: "public key (--public-key or the policy's publicKey)".to_string(),
        }
        .into()),
    }
}
