//! Rule engine boundary and result types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::GateResult;
use crate::policy::PolicyBundle;

/// Namespace the evaluator asks the engine to run.
pub const EVALUATION_ENTRYPOINT: &str = "main";

/// Structured document handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    /// Synthetic file name, used to group results.
    pub name: String,

    pub content: serde_json::Value,
}

/// Outcome of one rule against one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Warn,
    Exception,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
            Outcome::Warn => write!(f, "warn"),
            Outcome::Exception => write!(f, "exception"),
        }
    }
}

/// One rule result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule_id: String,
    pub outcome: Outcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CheckResult {
    pub fn new(rule_id: impl Into<String>, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            outcome,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Results for one input document, in engine order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub filename: String,
    pub namespace: String,
    pub results: Vec<CheckResult>,
}

impl EvaluationResult {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Compiles rule bundles into an engine.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(
        &self,
        ctx: &Context,
        sources: &[Arc<PolicyBundle>],
        data: Arc<PolicyBundle>,
    ) -> GateResult<Arc<dyn RuleEngine>>;
}

/// Loaded rules, ready to check inputs.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// One [`EvaluationResult`] per input, in input order.
    async fn check(
        &self,
        ctx: &Context,
        inputs: &[InputDocument],
        entrypoint: &str,
    ) -> GateResult<Vec<EvaluationResult>>;
}
