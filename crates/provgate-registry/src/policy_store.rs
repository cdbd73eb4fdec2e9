//! Policy specs on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use provgate_core::{Context, GateError, GateResult, PolicyConfigStore, PolicyName, PolicySpec};

/// Extensions tried, in order.
const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Resolves `namespace/name` to `<root>/<namespace>/<name>.{yaml,yml,json}`.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    root: PathBuf,
}

impl FilePolicyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &PolicyName) -> GateResult<Vec<PathBuf>> {
        let namespace_ok = name.namespace.is_empty() || is_relative_path(&name.namespace);
        if !namespace_ok || !is_relative_path(&name.name) {
            return Err(GateError::ResourceNotFound {
                name: name.to_string(),
            });
        }

        let dir = if name.has_namespace() {
            self.root.join(&name.namespace)
        } else {
            self.root.clone()
        };
        Ok(EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name.name, ext)))
            .collect())
    }
}

#[async_trait]
impl PolicyConfigStore for FilePolicyStore {
    async fn fetch_policy_spec(&self, ctx: &Context, name: &PolicyName) -> GateResult<PolicySpec> {
        for path in self.candidates(name)? {
            let content = match ctx.run(read_optional(&path)).await? {
                Some(content) => content,
                None => continue,
            };
            debug!(policy = %name, path = %path.display(), "loaded policy spec");
            return PolicySpec::from_yaml(name, &content);
        }

        Err(GateError::ResourceNotFound {
            name: name.to_string(),
        })
    }
}

/// Names come from the command line and must stay inside the root: no
/// absolute paths, no empty, `.` or `..` segments, no backslashes.
fn is_relative_path(s: &str) -> bool {
    !s.contains('\\')
        && !Path::new(s).is_absolute()
        && s.split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

async fn read_optional(path: &Path) -> GateResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GateError::SourceFetch {
            location: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "sources:\n  - ./rules.yaml\ndata: ./data.yaml\n";

    #[tokio::test]
    async fn test_fetch_namespaced_spec() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tenant")).unwrap();
        std::fs::write(dir.path().join("tenant/release.yaml"), SPEC).unwrap();

        let store = FilePolicyStore::new(dir.path());
        let name = PolicyName::parse("tenant/release").unwrap();
        let spec = store
            .fetch_policy_spec(&Context::background(), &name)
            .await
            .unwrap();
        assert_eq!(spec.sources, vec!["./rules.yaml"]);
    }

    #[tokio::test]
    async fn test_fetch_bare_name_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("release.json"),
            r#"{"sources": ["a.yaml"], "data": "d.yaml"}"#,
        )
        .unwrap();

        let store = FilePolicyStore::new(dir.path());
        let name = PolicyName::parse("release").unwrap();
        let spec = store
            .fetch_policy_spec(&Context::background(), &name)
            .await
            .unwrap();
        assert_eq!(spec.data, "d.yaml");
    }

    #[tokio::test]
    async fn test_missing_spec_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        let name = PolicyName::parse("tenant/absent").unwrap();
        let err = store
            .fetch_policy_spec(&Context::background(), &name)
            .await
            .unwrap_err();
        match err {
            GateError::ResourceNotFound { name } => assert_eq!(name, "tenant/absent"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_spec_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "sources: 12\n").unwrap();
        let store = FilePolicyStore::new(dir.path());
        let name = PolicyName::parse("broken").unwrap();
        assert!(matches!(
            store.fetch_policy_spec(&Context::background(), &name).await,
            Err(GateError::InvalidPolicySpec { .. })
        ));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path());
        let name = PolicyName::parse("../etc/passwd").unwrap();
        assert!(matches!(
            store.fetch_policy_spec(&Context::background(), &name).await,
            Err(GateError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_absolute_name_rejected() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("evil.yaml"), SPEC).unwrap();

        let store = FilePolicyStore::new(root.path());
        let input = format!("ns/{}/evil", outside.path().display());
        let name = PolicyName::parse(&input).unwrap();
        assert!(name.name.starts_with('/'));
        assert!(matches!(
            store.fetch_policy_spec(&Context::background(), &name).await,
            Err(GateError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn test_relative_path_rules() {
        assert!(is_relative_path("tenant"));
        assert!(is_relative_path("team/release"));
        assert!(!is_relative_path("/etc/passwd"));
        assert!(!is_relative_path("a//b"));
        assert!(!is_relative_path("./release"));
        assert!(!is_relative_path("a/.."));
        assert!(!is_relative_path("a\\b"));
    }
}
