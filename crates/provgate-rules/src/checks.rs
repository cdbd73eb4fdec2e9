//! Check implementations for bundle rules.

use regex::Regex;
use serde_json::Value;

use super::schema::{BundleError, BundleRule, CheckDefinition};

/// A check ready to run, with its pattern compiled.
#[derive(Debug, Clone)]
pub(crate) enum CompiledCheck {
    FieldPresent { path: String },
    FieldEquals { path: String, value: Value },
    FieldMatches { path: String, pattern: Regex },
    FieldInData { path: String, data: String },
}

impl CompiledCheck {
    /// Expects a rule whose bundle passed `RuleBundle::validate`; only the
    /// pattern is checked here, by compiling it.
    pub(crate) fn compile(rule: &BundleRule) -> Result<Self, BundleError> {
        Ok(match &rule.check {
            CheckDefinition::FieldPresent { path } => Self::FieldPresent { path: path.clone() },
            CheckDefinition::FieldEquals { path, value } => Self::FieldEquals {
                path: path.clone(),
                value: value.clone(),
            },
            CheckDefinition::FieldMatches { path, pattern } => Self::FieldMatches {
                path: path.clone(),
                pattern: Regex::new(pattern).map_err(|e| BundleError::InvalidCheck {
                    rule: rule.id.clone(),
                    reason: format!("invalid pattern: {}", e),
                })?,
            },
            CheckDefinition::FieldInData { path, data } => Self::FieldInData {
                path: path.clone(),
                data: data.clone(),
            },
        })
    }

    /// Run against one input.
    ///
    /// `Err` is a runtime failure (bad policy data), not a failing check.
    pub(crate) fn run(&self, input: &Value, data: &Value) -> Result<Verdict, String> {
        match self {
            Self::FieldPresent { path } => Ok(match non_null(input, path) {
                Some(v) => Verdict::pass(v),
                None => Verdict::fail(None, format!("{} is missing", path)),
            }),

            Self::FieldEquals { path, value } => Ok(match non_null(input, path) {
                Some(v) if v == value => Verdict::pass(v),
                Some(v) => Verdict::fail(
                    Some(v),
                    format!("{} is {}, expected {}", path, render(v), render(value)),
                ),
                None => Verdict::fail(None, format!("{} is missing", path)),
            }),

            Self::FieldMatches { path, pattern } => Ok(match non_null(input, path) {
                Some(Value::String(s)) if pattern.is_match(s) => Verdict::pass(&Value::String(s.clone())),
                Some(v) => Verdict::fail(
                    Some(v),
                    format!("{} value {} does not match {}", path, render(v), pattern.as_str()),
                ),
                None => Verdict::fail(None, format!("{} is missing", path)),
            }),

            Self::FieldInData { path, data: pointer } => {
                let allowed = data
                    .pointer(pointer)
                    .ok_or_else(|| format!("policy data has no value at {}", pointer))?
                    .as_array()
                    .ok_or_else(|| format!("policy data at {} is not a list", pointer))?;

                Ok(match non_null(input, path) {
                    Some(v) if allowed.contains(v) => Verdict::pass(v),
                    Some(v) => Verdict::fail(
                        Some(v),
                        format!("{} value {} is not listed in {}", path, render(v), pointer),
                    ),
                    None => Verdict::fail(None, format!("{} is missing", path)),
                })
            }
        }
    }
}

/// Result of one check against one input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Verdict {
    pub passed: bool,
    /// Observed value, if any.
    pub value: Option<Value>,
    /// Default failure reason.
    pub reason: String,
}

impl Verdict {
    fn pass(value: &Value) -> Self {
        Self {
            passed: true,
            value: Some(value.clone()),
            reason: String::new(),
        }
    }

    fn fail(value: Option<&Value>, reason: String) -> Self {
        Self {
            passed: false,
            value: value.cloned(),
            reason,
        }
    }
}

fn non_null<'a>(input: &'a Value, pointer: &str) -> Option<&'a Value> {
    input.pointer(pointer).filter(|v| !v.is_null())
}

/// Strings bare, everything else as JSON.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
