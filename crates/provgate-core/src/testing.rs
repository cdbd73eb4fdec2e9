//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::attestation::AttestationSignature;
use crate::context::Context;
use crate::engine::{
    CheckResult, EngineLoader, EvaluationResult, InputDocument, Outcome, RuleEngine,
};
use crate::error::{GateError, GateResult};
use crate::output::OutputOptions;
use crate::policy::{
    EvaluatorDeps, PolicyBundle, PolicyConfigStore, PolicyName, PolicySpec, SourceFetcher,
    SourceLocation,
};
use crate::signoff::{CommitFetcher, CommitMetadata, Identity};

const DELAY: Duration = Duration::from_millis(20);
const STALL: Duration = Duration::from_secs(30);

/// Every commit carries the same message.
pub struct StaticCommits {
    message: String,
    slow_repos: HashSet<String>,
}

impl StaticCommits {
    pub fn signed(message: &str) -> Self {
        Self {
            message: message.to_string(),
            slow_repos: HashSet::new(),
        }
    }

    pub fn with_delay(mut self, repo_url: &str) -> Self {
        self.slow_repos.insert(repo_url.to_string());
        self
    }
}

#[async_trait]
impl CommitFetcher for StaticCommits {
    async fn fetch_commit(
        &self,
        _ctx: &Context,
        repo_url: &str,
        sha: &str,
    ) -> GateResult<CommitMetadata> {
        if self.slow_repos.contains(repo_url) {
            tokio::time::sleep(DELAY).await;
        }
        Ok(CommitMetadata {
            sha: sha.to_string(),
            author: Identity {
                name: "ec builder".to_string(),
                email: "builder@example.com".to_string(),
            },
            message: self.message.clone(),
            timestamp: None,
        })
    }
}

/// Policy specs keyed by `namespace/name`.
#[derive(Default)]
pub struct MemoryPolicies {
    specs: HashMap<String, PolicySpec>,
}

impl MemoryPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, sources: &[&str], data: &str) -> Self {
        self.specs.insert(
            name.to_string(),
            PolicySpec {
                description: None,
                sources: sources.iter().map(|s| s.to_string()).collect(),
                data: data.to_string(),
                public_key: None,
            },
        );
        self
    }
}

#[async_trait]
impl PolicyConfigStore for MemoryPolicies {
    async fn fetch_policy_spec(&self, _ctx: &Context, name: &PolicyName) -> GateResult<PolicySpec> {
        self.specs
            .get(&name.to_string())
            .cloned()
            .ok_or_else(|| GateError::ResourceNotFound {
                name: name.to_string(),
            })
    }
}

/// Bundle contents keyed by location string.
#[derive(Default)]
pub struct MemorySources {
    contents: HashMap<String, String>,
    slow: HashSet<String>,
    stalled: HashSet<String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, content: &str) -> Self {
        self.contents
            .insert(location.to_string(), content.to_string());
        self
    }

    pub fn with_delay(mut self, location: &str) -> Self {
        self.slow.insert(location.to_string());
        self
    }

    /// Fetches of `location` never complete within a test.
    pub fn with_stall(mut self, location: &str) -> Self {
        self.stalled.insert(location.to_string());
        self
    }
}

#[async_trait]
impl SourceFetcher for MemorySources {
    async fn fetch(&self, _ctx: &Context, location: &SourceLocation) -> GateResult<PolicyBundle> {
        let key = location.to_string();
        if self.stalled.contains(&key) {
            tokio::time::sleep(STALL).await;
        } else if self.slow.contains(&key) {
            tokio::time::sleep(DELAY).await;
        }
        let content = self
            .contents
            .get(&key)
            .ok_or_else(|| GateError::SourceFetch {
                location: key.clone(),
                reason: "not found".to_string(),
            })?;
        Ok(PolicyBundle::new(location.clone(), content.as_str()))
    }
}

/// Loads an engine that passes one rule per rule bundle, named after the
/// bundle content.
#[derive(Default)]
pub struct EchoEngineLoader {
    fail_with: Option<String>,
}

impl EchoEngineLoader {
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl EngineLoader for EchoEngineLoader {
    async fn load(
        &self,
        _ctx: &Context,
        sources: &[Arc<PolicyBundle>],
        _data: Arc<PolicyBundle>,
    ) -> GateResult<Arc<dyn RuleEngine>> {
        if let Some(reason) = &self.fail_with {
            return Err(GateError::EngineLoad {
                reason: reason.clone(),
            });
        }
        Ok(Arc::new(EchoEngine {
            rules: sources.iter().map(|b| b.content.clone()).collect(),
        }))
    }
}

struct EchoEngine {
    rules: Vec<String>,
}

#[async_trait]
impl RuleEngine for EchoEngine {
    async fn check(
        &self,
        _ctx: &Context,
        inputs: &[InputDocument],
        entrypoint: &str,
    ) -> GateResult<Vec<EvaluationResult>> {
        Ok(inputs
            .iter()
            .map(|input| EvaluationResult {
                filename: input.name.clone(),
                namespace: entrypoint.to_string(),
                results: self
                    .rules
                    .iter()
                    .map(|rule| {
                        CheckResult::new(
                            rule.as_str(),
                            Outcome::Pass,
                            format!("checked {}", input.content["predicateType"]),
                        )
                    })
                    .collect(),
            })
            .collect())
    }
}

/// Minimal in-toto statement signature with the given predicate type.
pub fn statement(predicate_type: &str) -> AttestationSignature {
    let payload = serde_json::json!({
        "_type": "https://in-toto.io/Statement/v0.1",
        "predicateType": predicate_type,
        "subject": [],
        "predicate": { "materials": [] },
    });
    AttestationSignature::new(serde_json::to_vec(&payload).unwrap_or_default())
}

/// `tenant/release` backed by `rules.yaml` and `data.yaml`.
pub fn fixture_deps() -> EvaluatorDeps {
    EvaluatorDeps {
        config_store: Arc::new(MemoryPolicies::new().with(
            "tenant/release",
            &["rules.yaml"],
            "data.yaml",
        )),
        sources: Arc::new(
            MemorySources::new()
                .with("rules.yaml", "rules")
                .with("data.yaml", "{}"),
        ),
        engine_loader: Arc::new(EchoEngineLoader::default()),
        output: OutputOptions::default(),
    }
}
