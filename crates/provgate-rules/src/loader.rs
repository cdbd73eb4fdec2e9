//! Bundle loader with YAML parsing and validation.
//!
//! Parsing is strict: unknown fields and unknown check types are rejected,
//! so a typo in a rule bundle fails the load instead of silently passing.

use std::collections::HashSet;

use serde_json::Value;

use provgate_core::PolicyBundle;

use super::checks::CompiledCheck;
use super::schema::{BundleError, BundleRule, RuleBundle};

/// Data pointer naming rules that yield `exception` instead of running.
pub const RULE_EXCEPTIONS_POINTER: &str = "/rule_exceptions";

/// A rule with its compiled check.
#[derive(Debug, Clone)]
pub(crate) struct LoadedRule {
    pub rule: BundleRule,
    pub check: CompiledCheck,
}

/// A loaded and validated bundle.
#[derive(Debug, Clone)]
pub struct LoadedBundle {
    pub namespace: String,
    /// Digest of the source content.
    pub digest: String,
    /// Where the bundle came from.
    pub location: String,
    pub(crate) rules: Vec<LoadedRule>,
}

impl LoadedBundle {
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.rule.id.as_str())
    }
}

/// Parse and compile one rule bundle.
pub fn load_bundle(source: &PolicyBundle) -> Result<LoadedBundle, BundleError> {
    let location = source.location.to_string();
    let bundle: RuleBundle =
        serde_yaml::from_str(&source.content).map_err(|e| BundleError::Parse {
            location: location.clone(),
            message: e.to_string(),
        })?;
    bundle.validate()?;

    let rules = bundle
        .rules
        .into_iter()
        .map(|rule| {
            let check = CompiledCheck::compile(&rule)?;
            Ok(LoadedRule { rule, check })
        })
        .collect::<Result<Vec<_>, BundleError>>()?;

    Ok(LoadedBundle {
        namespace: bundle.namespace,
        digest: source.digest.clone(),
        location,
        rules,
    })
}

/// Load several bundles, rejecting rule IDs repeated within a namespace.
pub fn load_bundles(sources: &[impl AsRef<PolicyBundle>]) -> Result<Vec<LoadedBundle>, BundleError> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut loaded = Vec::with_capacity(sources.len());

    for source in sources {
        let bundle = load_bundle(source.as_ref())?;
        for id in bundle.rule_ids() {
            if !seen.insert((bundle.namespace.clone(), id.to_string())) {
                return Err(BundleError::DuplicateRuleId {
                    namespace: bundle.namespace.clone(),
                    rule_id: id.to_string(),
                });
            }
        }
        loaded.push(bundle);
    }
    Ok(loaded)
}

/// Policy data as JSON. Empty content is an empty object.
pub fn load_data(source: &PolicyBundle) -> Result<Value, BundleError> {
    let data_error = |message: String| BundleError::Data {
        location: source.location.to_string(),
        message,
    };

    if source.content.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let data: Value =
        serde_yaml::from_str(&source.content).map_err(|e| data_error(e.to_string()))?;
    match data {
        Value::Object(_) => Ok(data),
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        _ => Err(data_error("policy data must be a mapping".to_string())),
    }
}

/// Rule IDs listed under [`RULE_EXCEPTIONS_POINTER`] in `data`, the
/// parsed content of `source`.
pub fn rule_exceptions(
    source: &PolicyBundle,
    data: &Value,
) -> Result<HashSet<String>, BundleError> {
    let Some(list) = data.pointer(RULE_EXCEPTIONS_POINTER) else {
        return Ok(HashSet::new());
    };

    let invalid = || BundleError::Data {
        location: source.location.to_string(),
        message: format!("{} must be a list of rule IDs", RULE_EXCEPTIONS_POINTER),
    };

    list.as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(invalid))
        .collect()
}
