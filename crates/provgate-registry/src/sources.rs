//! Rule and data bundle retrieval.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use provgate_core::{
    Context, GateError, GateResult, PolicyBundle, SourceFetcher, SourceLocation,
};

use crate::http::{build_client, success_text};
use crate::types::RegistryConfig;

/// Fetches bundles from local files and HTTP(S) URLs.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    pub fn new(config: &RegistryConfig) -> GateResult<Self> {
        let client = build_client(config.timeout_secs).map_err(|reason| GateError::SourceFetch {
            location: "<client>".to_string(),
            reason,
        })?;
        Ok(Self { client })
    }

    async fn fetch_file(&self, path: &Path) -> GateResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GateError::SourceFetch {
                location: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_url(&self, url: &Url) -> GateResult<String> {
        let failed = |reason: String| GateError::SourceFetch {
            location: url.to_string(),
            reason,
        };

        debug!(url = %url, "fetching policy source");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        success_text(response).await.map_err(failed)
    }
}

#[async_trait]
impl SourceFetcher for SourceClient {
    async fn fetch(&self, ctx: &Context, location: &SourceLocation) -> GateResult<PolicyBundle> {
        let content = match location {
            SourceLocation::File(path) => ctx.run(self.fetch_file(path)).await?,
            SourceLocation::Http(url) => ctx.run(self.fetch_url(url)).await?,
        };
        Ok(PolicyBundle::new(location.clone(), content))
    }
}
