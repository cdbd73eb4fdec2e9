//! Declarative rule engine for provgate.
//!
//! Rule sources are YAML bundles; policy data is a YAML or JSON mapping.
//! Each rule runs one check against every input document and yields a
//! [`provgate_core::CheckResult`].
//!
//! # Bundle format
//!
//! ```yaml
//! namespace: main
//! rules:
//!   - id: builder-allowed
//!     description: Builder must be on the allow list
//!     message: "builder {value} is not allowed"
//!     check:
//!       type: field_in_data
//!       path: /predicate/builder/id
//!       data: /allowed_builders
//! ```
//!
//! Check types: `field_present`, `field_equals`, `field_matches`, `field_in_data`.
//! Rules listed under `rule_exceptions` in the policy data report `exception`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use provgate_core::EngineLoader;
//! use provgate_rules::BundleEngineLoader;
//!
//! let loader: Arc<dyn EngineLoader> = Arc::new(BundleEngineLoader::new());
//! # let _ = loader;
//! ```

mod checks;
pub mod engine;
pub mod loader;
pub mod schema;

pub use engine::{BundleEngine, BundleEngineLoader};
pub use loader::{load_bundle, load_bundles, load_data, LoadedBundle, RULE_EXCEPTIONS_POINTER};
pub use schema::{BundleError, BundleRule, CheckDefinition, RuleBundle, Severity, DEFAULT_NAMESPACE};
