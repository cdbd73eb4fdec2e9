//! Sign-off resolution.
//!
//! Derives the authorization record for a build from its attestation:
//!
//! 1. The material extractor picks the material naming the source revision.
//! 2. [`SignOffResolver::resolve`] turns it into a [`SignOffSource`].
//! 3. [`SignOffSource::sign_off`] fetches corroborating metadata and yields a
//!    [`SignOff`], or `None` when the source carries no sign-off.
//!
//! A missing source is an error; a source without a sign-off is not.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attestation::{Attestation, AttestationSignature};
use crate::context::Context;
use crate::error::{GateError, GateResult};

pub mod trailer;

pub use trailer::{parse_sign_off, parse_sign_offs, SIGN_OFF_PREFIX};

/// Name and email of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Commit metadata returned by a [`CommitFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub sha: String,
    pub author: Identity,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Looks up a commit by repository URL and sha.
#[async_trait]
pub trait CommitFetcher: Send + Sync {
    async fn fetch_commit(
        &self,
        ctx: &Context,
        repo_url: &str,
        sha: &str,
    ) -> GateResult<CommitMetadata>;
}

/// Kind of system a sign-off was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignOffKind {
    Git,
    Jira,
}

/// A recorded authorization event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOff {
    pub kind: SignOffKind,

    /// Commit sha or ticket id.
    pub source_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Identity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// First `Signed-off-by:` trailer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_off_by: Option<Identity>,
}

/// Where a sign-off can be looked up.
#[derive(Debug, Clone)]
pub enum SignOffSource {
    Git(GitSource),
    /// Issue tracker ticket. Ticket fetching is not implemented yet, so the
    /// sign-off carries only the issue reference.
    Jira(JiraSource),
}

impl SignOffSource {
    /// Fetch the sign-off, if the source carries one.
    pub async fn sign_off(&self, ctx: &Context) -> GateResult<Option<SignOff>> {
        match self {
            Self::Git(git) => git.sign_off(ctx).await,
            Self::Jira(jira) => Ok(Some(jira.sign_off())),
        }
    }

    pub fn kind(&self) -> SignOffKind {
        match self {
            Self::Git(_) => SignOffKind::Git,
            Self::Jira(_) => SignOffKind::Jira,
        }
    }
}

/// A commit in a git repository.
#[derive(Clone)]
pub struct GitSource {
    repo_url: String,
    commit_sha: String,
    commits: Arc<dyn CommitFetcher>,
}

impl GitSource {
    pub fn new(
        repo_url: impl Into<String>,
        commit_sha: impl Into<String>,
        commits: Arc<dyn CommitFetcher>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            commit_sha: commit_sha.into(),
            commits,
        }
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    async fn sign_off(&self, ctx: &Context) -> GateResult<Option<SignOff>> {
        let commit = ctx
            .run(
                self.commits
                    .fetch_commit(ctx, &self.repo_url, &self.commit_sha),
            )
            .await?;

        let Some(signed_off_by) = parse_sign_off(&commit.message) else {
            debug!(repo = %self.repo_url, sha = %self.commit_sha, "commit has no sign-off trailer");
            return Ok(None);
        };

        Ok(Some(SignOff {
            kind: SignOffKind::Git,
            source_id: self.commit_sha.clone(),
            author: Some(commit.author),
            message: Some(commit.message),
            timestamp: commit.timestamp,
            signed_off_by: Some(signed_off_by),
        }))
    }
}

impl fmt::Debug for GitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitSource")
            .field("repo_url", &self.repo_url)
            .field("commit_sha", &self.commit_sha)
            .finish_non_exhaustive()
    }
}

impl PartialEq for GitSource {
    fn eq(&self, other: &Self) -> bool {
        self.repo_url == other.repo_url && self.commit_sha == other.commit_sha
    }
}

/// An issue tracker ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraSource {
    issue: String,
}

impl JiraSource {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
        }
    }

    pub fn issue(&self) -> &str {
        &self.issue
    }

    fn sign_off(&self) -> SignOff {
        SignOff {
            kind: SignOffKind::Jira,
            source_id: self.issue.clone(),
            author: None,
            message: None,
            timestamp: None,
            signed_off_by: None,
        }
    }
}

/// Builds [`SignOffSource`]s from attestations.
#[derive(Clone)]
pub struct SignOffResolver {
    commits: Arc<dyn CommitFetcher>,
}

impl SignOffResolver {
    pub fn new(commits: Arc<dyn CommitFetcher>) -> Self {
        Self { commits }
    }

    /// Resolve the sign-off source named by the attestation's materials.
    ///
    /// Pure function of the attestation; no I/O happens here.
    pub fn resolve(&self, attestation: &Attestation) -> GateResult<SignOffSource> {
        let material = attestation.build_material();
        let sha = material
            .digest
            .get(crate::attestation::COMMIT_DIGEST_ALGORITHM)
            .cloned()
            .unwrap_or_default();

        if material.uri.is_empty() || sha.is_empty() {
            return Err(GateError::NoAuthorizationSource {
                sha,
                uri: material.uri,
            });
        }

        Ok(SignOffSource::Git(GitSource::new(
            material.uri,
            sha,
            Arc::clone(&self.commits),
        )))
    }

    /// Resolve and fetch the sign-off for one attestation signature.
    pub async fn sign_off(
        &self,
        ctx: &Context,
        index: usize,
        signature: &AttestationSignature,
    ) -> GateResult<Option<SignOff>> {
        let attestation = signature.attestation(index)?;
        let source = self.resolve(&attestation)?;
        debug!(index, kind = ?source.kind(), "resolved sign-off source");
        source.sign_off(ctx).await
    }
}

/// Sign-offs for every attestation, in input order.
///
/// Attestations are resolved concurrently. Any attestation without a
/// sign-off source fails the whole batch; sources without a sign-off are
/// skipped.
pub async fn collect_sign_offs(
    ctx: &Context,
    resolver: &SignOffResolver,
    signatures: &[AttestationSignature],
) -> GateResult<Vec<SignOff>> {
    let lookups = signatures
        .iter()
        .enumerate()
        .map(|(index, signature)| resolver.sign_off(ctx, index, signature));

    let sign_offs: Vec<SignOff> = ctx
        .run(try_join_all(lookups))
        .await?
        .into_iter()
        .flatten()
        .collect();

    info!(
        attestations = signatures.len(),
        sign_offs = sign_offs.len(),
        "collected sign-offs"
    );
    Ok(sign_offs)
}
