//! Rule bundle schema types.
//!
//! A bundle is a YAML document with a `namespace` and a list of rules. Each
//! rule carries exactly one check, addressed by JSON Pointer (RFC 6901) into
//! the input document and, for `field_in_data`, into the policy data.

use serde::{Deserialize, Serialize};

/// Namespace used when a bundle does not declare one.
pub const DEFAULT_NAMESPACE: &str = "main";

/// Outcome a failing rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Failure,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Failure => write!(f, "failure"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule bundle as loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBundle {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub description: Option<String>,

    pub rules: Vec<BundleRule>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl RuleBundle {
    /// Validate the bundle on its own. Cross-bundle checks happen at load.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.namespace.is_empty() {
            return Err(BundleError::EmptyNamespace);
        }

        let mut seen_ids = std::collections::HashSet::new();
        for rule in &self.rules {
            if rule.id.is_empty() {
                return Err(BundleError::EmptyRuleId {
                    namespace: self.namespace.clone(),
                });
            }
            if !seen_ids.insert(&rule.id) {
                return Err(BundleError::DuplicateRuleId {
                    namespace: self.namespace.clone(),
                    rule_id: rule.id.clone(),
                });
            }
            rule.check.validate(&rule.id)?;
        }
        Ok(())
    }
}

/// Rule definition within a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleRule {
    /// Rule ID (unique within the namespace).
    pub id: String,

    /// One-line description, used as the passing message.
    #[serde(default)]
    pub description: String,

    #[serde(default = "default_severity")]
    pub severity: Severity,

    /// Failure message template. `{value}` is replaced by the observed value.
    #[serde(default)]
    pub message: Option<String>,

    pub check: CheckDefinition,
}

fn default_severity() -> Severity {
    Severity::Failure
}

/// Check definition (tagged union).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CheckDefinition {
    /// Field exists and is not null.
    FieldPresent { path: String },

    /// Field equals a literal value.
    FieldEquals {
        path: String,
        value: serde_json::Value,
    },

    /// String field matches a regular expression.
    FieldMatches { path: String, pattern: String },

    /// Field value is listed in a policy data array.
    FieldInData {
        path: String,
        /// JSON Pointer into the data bundle.
        data: String,
    },
}

impl CheckDefinition {
    /// Validate JSON pointers. Patterns are checked when the rule is
    /// compiled at load.
    pub fn validate(&self, rule_id: &str) -> Result<(), BundleError> {
        let invalid = |reason: String| BundleError::InvalidCheck {
            rule: rule_id.to_string(),
            reason,
        };

        validate_pointer(self.path()).map_err(invalid)?;
        if let CheckDefinition::FieldInData { data, .. } = self {
            validate_pointer(data).map_err(invalid)?;
        }
        Ok(())
    }

    /// Input pointer the check reads.
    pub fn path(&self) -> &str {
        match self {
            CheckDefinition::FieldPresent { path }
            | CheckDefinition::FieldEquals { path, .. }
            | CheckDefinition::FieldMatches { path, .. }
            | CheckDefinition::FieldInData { path, .. } => path,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CheckDefinition::FieldPresent { .. } => "field_present",
            CheckDefinition::FieldEquals { .. } => "field_equals",
            CheckDefinition::FieldMatches { .. } => "field_matches",
            CheckDefinition::FieldInData { .. } => "field_in_data",
        }
    }
}

fn validate_pointer(pointer: &str) -> Result<(), String> {
    if !pointer.starts_with('/') {
        return Err(format!("'{}' is not a JSON pointer", pointer));
    }
    // '~' must be followed by 0 or 1
    let mut chars = pointer.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.peek(), Some('0') | Some('1')) {
            return Err(format!("'{}' has an invalid escape", pointer));
        }
    }
    Ok(())
}

/// Bundle loading error.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to parse rule bundle {location}: {message}")]
    Parse { location: String, message: String },

    #[error("failed to parse policy data {location}: {message}")]
    Data { location: String, message: String },

    #[error("rule bundle has an empty namespace")]
    EmptyNamespace,

    #[error("namespace '{namespace}' has an empty rule ID")]
    EmptyRuleId { namespace: String },

    #[error("namespace '{namespace}' has duplicate rule ID '{rule_id}'")]
    DuplicateRuleId { namespace: String, rule_id: String },

    #[error("rule '{rule}' has invalid check: {reason}")]
    InvalidCheck { rule: String, reason: String },
}

impl From<BundleError> for provgate_core::GateError {
    fn from(err: BundleError) -> Self {
        Self::EngineLoad {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<RuleBundle, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn test_parse_bundle() {
        let bundle = parse(
            r#"
rules:
  - id: builder-allowed
    description: Builder must be on the allow list
    message: "builder {value} is not allowed"
    check:
      type: field_in_data
      path: /predicate/builder/id
      data: /allowed_builders
  - id: slsa
    severity: warning
    check:
      type: field_equals
      path: /predicateType
      value: https://slsa.dev/provenance/v0.2
"#,
        )
        .unwrap();
        assert_eq!(bundle.namespace, DEFAULT_NAMESPACE);
        assert_eq!(bundle.rules[0].severity, Severity::Failure);
        assert_eq!(bundle.rules[1].severity, Severity::Warning);
        assert_eq!(bundle.rules[0].check.type_name(), "field_in_data");
        bundle.validate().unwrap();
    }

    #[test]
    fn test_unknown_check_type_rejected() {
        let err = parse("rules:\n  - id: x\n    check:\n      type: rego\n      path: /a\n")
            .unwrap_err();
        assert!(err.to_string().contains("rego"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse("rules: []\nversion: 2\n").is_err());
    }

    #[test]
    fn test_duplicate_rule_ids() {
        let bundle = parse(
            "rules:\n  - id: a\n    check: {type: field_present, path: /a}\n  - id: a\n    check: {type: field_present, path: /b}\n",
        )
        .unwrap();
        assert!(matches!(
            bundle.validate(),
            Err(BundleError::DuplicateRuleId { .. })
        ));
    }

    #[test]
    fn test_empty_rule_id() {
        let bundle = parse("rules:\n  - id: ''\n    check: {type: field_present, path: /a}\n").unwrap();
        assert!(matches!(
            bundle.validate(),
            Err(BundleError::EmptyRuleId { .. })
        ));
    }

    #[test]
    fn test_invalid_pointers() {
        let bad_pointer = CheckDefinition::FieldPresent {
            path: "predicate".into(),
        };
        assert!(bad_pointer.validate("r").is_err());

        let bad_escape = CheckDefinition::FieldPresent { path: "/a~2".into() };
        assert!(bad_escape.validate("r").is_err());

        let bad_data = CheckDefinition::FieldInData {
            path: "/a".into(),
            data: "allowed".into(),
        };
        assert!(matches!(
            bad_data.validate("r"),
            Err(BundleError::InvalidCheck { .. })
        ));
    }

    #[test]
    fn test_error_converts_to_engine_load() {
        let err: provgate_core::GateError = BundleError::EmptyNamespace.into();
        assert!(matches!(err, provgate_core::GateError::EngineLoad { .. }));
    }
}
