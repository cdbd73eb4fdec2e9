//! Bundle engine: the [`EngineLoader`] / [`RuleEngine`] implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use provgate_core::{
    CheckResult, Context, EngineLoader, EvaluationResult, GateError, GateResult, InputDocument,
    Outcome, PolicyBundle, RuleEngine,
};

use super::checks::render;
use super::loader::{load_bundles, load_data, rule_exceptions, LoadedBundle, LoadedRule};
use super::schema::Severity;

/// Loads declarative YAML rule bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleEngineLoader;

impl BundleEngineLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineLoader for BundleEngineLoader {
    async fn load(
        &self,
        ctx: &Context,
        sources: &[Arc<PolicyBundle>],
        data: Arc<PolicyBundle>,
    ) -> GateResult<Arc<dyn RuleEngine>> {
        if ctx.is_cancelled() {
            return Err(GateError::Canceled);
        }
        let engine = BundleEngine::new(sources, &data)?;
        Ok(Arc::new(engine))
    }
}

/// Compiled bundles plus policy data.
#[derive(Debug, Clone)]
pub struct BundleEngine {
    bundles: Vec<LoadedBundle>,
    data: Value,
    exceptions: HashSet<String>,
}

impl BundleEngine {
    pub fn new(sources: &[Arc<PolicyBundle>], data_bundle: &PolicyBundle) -> GateResult<Self> {
        let bundles = load_bundles(sources)?;
        let data = load_data(data_bundle)?;
        let exceptions = rule_exceptions(data_bundle, &data)?;

        info!(
            bundles = bundles.len(),
            rules = bundles.iter().map(|b| b.rule_ids().count()).sum::<usize>(),
            exceptions = exceptions.len(),
            "rule engine loaded"
        );
        Ok(Self {
            bundles,
            data,
            exceptions,
        })
    }

    /// Rules of `namespace`, bundle order then rule order.
    fn rules_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a LoadedRule> + 'a {
        self.bundles
            .iter()
            .filter(move |b| b.namespace == namespace)
            .flat_map(|b| b.rules.iter())
    }

    fn check_input(&self, input: &InputDocument, namespace: &str) -> GateResult<EvaluationResult> {
        let mut results = Vec::new();

        for loaded in self.rules_in(namespace) {
            let rule = &loaded.rule;

            if self.exceptions.contains(&rule.id) {
                debug!(rule = %rule.id, "rule excepted by policy data");
                results.push(
                    CheckResult::new(&rule.id, Outcome::Exception, "rule excepted by policy data")
                        .with_metadata("description", Value::String(rule.description.clone())),
                );
                continue;
            }

            let verdict =
                loaded
                    .check
                    .run(&input.content, &self.data)
                    .map_err(|reason| GateError::EngineCheck {
                        reason: format!("rule '{}' on {}: {}", rule.id, input.name, reason),
                    })?;

            let result = if verdict.passed {
                CheckResult::new(&rule.id, Outcome::Pass, pass_message(&rule.description))
            } else {
                let outcome = match rule.severity {
                    Severity::Failure => Outcome::Fail,
                    Severity::Warning => Outcome::Warn,
                };
                let message = match (&rule.message, &verdict.value) {
                    (Some(template), Some(value)) => template.replace("{value}", &render(value)),
                    (Some(template), None) => template.replace("{value}", "<missing>"),
                    (None, _) => verdict.reason.clone(),
                };
                CheckResult::new(&rule.id, outcome, message)
            };

            results.push(
                result
                    .with_metadata("description", Value::String(rule.description.clone()))
                    .with_metadata("check", Value::String(rule.check.type_name().to_string())),
            );
        }

        Ok(EvaluationResult {
            filename: input.name.clone(),
            namespace: namespace.to_string(),
            results,
        })
    }
}

fn pass_message(description: &str) -> String {
    if description.is_empty() {
        "passed".to_string()
    } else {
        description.to_string()
    }
}

#[async_trait]
impl RuleEngine for BundleEngine {
    async fn check(
        &self,
        ctx: &Context,
        inputs: &[InputDocument],
        entrypoint: &str,
    ) -> GateResult<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            if ctx.is_cancelled() {
                return Err(GateError::Canceled);
            }
            results.push(self.check_input(input, entrypoint)?);
        }
        Ok(results)
    }
}
