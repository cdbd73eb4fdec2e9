//! Commit lookup through a GitHub-compatible REST API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::debug;

use provgate_core::{CommitFetcher, CommitMetadata, Context, GateError, GateResult, Identity};

use crate::http::{build_client, success_text};
use crate::types::{CommitResponse, RegistryConfig};

/// Fetches commits with `GET {api}/repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Clone)]
pub struct GitHubCommitFetcher {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubCommitFetcher {
    pub fn new(config: &RegistryConfig) -> GateResult<Self> {
        let client = build_client(config.timeout_secs).map_err(|reason| GateError::CommitFetch {
            repo_url: config.forge_api_url.clone(),
            sha: String::new(),
            reason,
        })?;
        Ok(Self {
            client,
            api_url: config.forge_api_url.trim_end_matches('/').to_string(),
            token: config.forge_token.clone(),
        })
    }

    fn commit_url(&self, repo_url: &str, sha: &str) -> Result<String, String> {
        if sha.is_empty() || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("commit sha '{}' is not hexadecimal", sha));
        }
        let (owner, repo) = owner_and_repo(repo_url)?;
        Ok(format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url, owner, repo, sha
        ))
    }

    async fn fetch(&self, repo_url: &str, sha: &str) -> Result<CommitMetadata, String> {
        let url = self.commit_url(repo_url, sha)?;
        debug!(url = %url, "fetching commit");

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let body = success_text(response).await?;
        let commit: CommitResponse =
            serde_json::from_str(&body).map_err(|e| format!("invalid commit response: {}", e))?;

        Ok(CommitMetadata {
            sha: commit.sha,
            author: Identity {
                name: commit.commit.author.name,
                email: commit.commit.author.email,
            },
            message: commit.commit.message,
            timestamp: commit.commit.author.date,
        })
    }
}

/// Last two path segments of a repository URL, `.git` stripped.
pub(crate) fn owner_and_repo(repo_url: &str) -> Result<(String, String), String> {
    // scp-like `git@host:owner/repo.git`
    let path = match url::Url::parse(repo_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => repo_url
            .split_once(':')
            .map(|(_, path)| path.to_string())
            .unwrap_or_else(|| repo_url.to_string()),
    };

    let mut segments = path
        .trim_end_matches('/')
        .rsplit('/')
        .filter(|s| !s.is_empty());
    let repo = segments.next().map(|r| r.trim_end_matches(".git"));
    let owner = segments.next();

    match (owner, repo) {
        (Some(owner), Some(repo)) if is_path_segment(owner) && is_path_segment(repo) => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(format!("cannot derive owner/repo from {}", repo_url)),
    }
}

/// GitHub owner and repository names: ASCII alphanumerics, `-`, `_`, `.`.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[async_trait]
impl CommitFetcher for GitHubCommitFetcher {
    async fn fetch_commit(
        &self,
        ctx: &Context,
        repo_url: &str,
        sha: &str,
    ) -> GateResult<CommitMetadata> {
        let result = ctx
            .run(async { Ok(self.fetch(repo_url, sha).await) })
            .await?;
        result.map_err(|reason| GateError::CommitFetch {
            repo_url: repo_url.to_string(),
            sha: sha.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_and_repo() {
        let cases = [
            ("https://github.com/acme/widget.git", ("acme", "widget")),
            ("https://github.com/acme/widget", ("acme", "widget")),
            ("https://github.com/acme/widget/", ("acme", "widget")),
            ("git@github.com:acme/widget.git", ("acme", "widget")),
        ];
        for (input, (owner, repo)) in cases {
            assert_eq!(
                owner_and_repo(input).unwrap(),
                (owner.to_string(), repo.to_string()),
                "{input}"
            );
        }
    }

    #[test]
    fn test_owner_and_repo_rejects_short_paths() {
        assert!(owner_and_repo("https://github.com/widget").is_err());
        assert!(owner_and_repo("").is_err());
    }

    #[test]
    fn test_commit_url() {
        let config = RegistryConfig::default().with_forge_api_url("http://localhost:9999/");
        let fetcher = GitHubCommitFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher
                .commit_url("https://github.com/acme/widget.git", "abc123")
                .unwrap(),
            "http://localhost:9999/repos/acme/widget/commits/abc123"
        );
    }

    #[test]
    fn test_commit_url_rejects_path_injection() {
        let fetcher = GitHubCommitFetcher::new(&RegistryConfig::default()).unwrap();
        let repo = "https://github.com/acme/widget.git";
        assert!(fetcher.commit_url(repo, "../../user").is_err());
        assert!(fetcher.commit_url(repo, "abc?x=1").is_err());
        assert!(fetcher.commit_url(repo, "").is_err());
        assert!(fetcher
            .commit_url("https://github.com/ac%2Fme/widget", "abc123")
            .is_err());
        assert!(fetcher.commit_url("https://example.com/../widget", "abc123").is_err());
    }
}
