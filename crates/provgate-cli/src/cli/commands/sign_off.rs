use std::io::Write;
use std::sync::Arc;

use provgate_core::{collect_sign_offs, AttestationFetcher, GateError, SignOffResolver};
use provgate_registry::{AttestationStore, GitHubCommitFetcher, RegistryConfig};
use tracing::info;

use crate::cli::args::SignOffArgs;
use crate::cli::helpers::{command_context, read_public_key};
use crate::exit_codes::SUCCESS;

pub async fn run(args: SignOffArgs) -> anyhow::Result<i32> {
    let public_key = read_public_key(&args.public_key)?;

    let mut config = RegistryConfig::from_env()
        .with_attestation_store(&args.image.attestation_store)
        .with_forge_api_url(&args.forge_api_url)
        .with_timeout_secs(args.image.timeout);
    if let Some(token) = &args.forge_token {
        config = config.with_forge_token(token);
    }

    let store = AttestationStore::new(&config.attestation_store);
    let resolver = SignOffResolver::new(Arc::new(GitHubCommitFetcher::new(&config)?));
    let ctx = command_context(args.image.timeout);

    let image = store
        .fetch_attested_image(
            &ctx,
            &args.image.image_ref,
            &public_key,
            args.image.identity.as_deref(),
        )
        .await?;
    info!(
        image = %image.reference,
        attestations = image.attestations.len(),
        "verified image attestations"
    );

    let sign_offs = collect_sign_offs(&ctx, &resolver, &image.attestations).await?;

    let mut out = std::io::stdout().lock();
    for sign_off in &sign_offs {
        let line = serde_json::to_string(sign_off).map_err(|e| GateError::Serialization {
            reason: e.to_string(),
        })?;
        writeln!(out, "{line}")?;
    }
    Ok(SUCCESS)
}
