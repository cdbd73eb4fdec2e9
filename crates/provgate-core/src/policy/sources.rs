//! Fetching the rule and data bundles a policy spec declares.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::context::Context;
use crate::error::{GateError, GateResult};

use super::spec::{PolicyBundle, PolicySpec, SourceFetcher};

/// Fetch every rule source, concurrently, in declared order.
///
/// The first failure aborts the rest.
pub async fn fetch_rule_sources(
    ctx: &Context,
    fetcher: &dyn SourceFetcher,
    spec: &PolicySpec,
) -> GateResult<Vec<Arc<PolicyBundle>>> {
    let locations = spec.source_locations()?;

    let fetches = locations.iter().map(|location| async move {
        let bundle = fetcher.fetch(ctx, location).await?;
        debug!(location = %bundle.location, digest = %bundle.digest, "fetched rule source");
        Ok::<_, GateError>(Arc::new(bundle))
    });

    ctx.run(try_join_all(fetches)).await
}

/// Fetch the data bundle.
pub async fn fetch_policy_data(
    ctx: &Context,
    fetcher: &dyn SourceFetcher,
    spec: &PolicySpec,
) -> GateResult<Arc<PolicyBundle>> {
    let location = spec.data_location()?;
    let bundle = ctx.run(fetcher.fetch(ctx, &location)).await?;
    debug!(location = %bundle.location, digest = %bundle.digest, "fetched policy data");
    Ok(Arc::new(bundle))
}
