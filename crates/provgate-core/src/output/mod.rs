//! Serializing evaluation results.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{EvaluationResult, Outcome};
use crate::error::{GateError, GateResult};

mod junit;
mod table;

/// Result serialization format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Junit,
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Junit => write!(f, "junit"),
            Self::Table => write!(f, "table"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "junit" => Ok(Self::Junit),
            "table" | "text" => Ok(Self::Table),
            other => Err(GateError::MissingInput {
                what: format!("a known output format (got '{}')", other),
            }),
        }
    }
}

/// How results are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_true")]
    pub no_color: bool,

    /// Drop `exception` outcomes from the output.
    #[serde(default)]
    pub suppress_exceptions: bool,

    /// Omit rule messages from junit element bodies.
    #[serde(default = "default_true")]
    pub hide_assertion_messages: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            no_color: true,
            suppress_exceptions: false,
            hide_assertion_messages: true,
        }
    }
}

impl OutputOptions {
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.no_color = !color;
        self
    }

    pub fn with_suppress_exceptions(mut self, suppress: bool) -> Self {
        self.suppress_exceptions = suppress;
        self
    }

    pub fn with_assertion_messages(mut self, show: bool) -> Self {
        self.hide_assertion_messages = !show;
        self
    }
}

/// Writes results in the configured format.
#[derive(Debug, Clone, Default)]
pub struct Outputter {
    options: OutputOptions,
}

impl Outputter {
    pub fn new(options: OutputOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    pub fn write(&self, results: &[EvaluationResult], out: &mut dyn Write) -> GateResult<()> {
        let filtered;
        let results = if self.options.suppress_exceptions {
            filtered = without_exceptions(results);
            filtered.as_slice()
        } else {
            results
        };

        let rendered = match self.options.format {
            OutputFormat::Json => serde_json::to_string_pretty(results).map_err(|e| {
                GateError::Serialization {
                    reason: e.to_string(),
                }
            })?,
            OutputFormat::Junit => junit::render(results, self.options.hide_assertion_messages),
            OutputFormat::Table => table::render(results, !self.options.no_color),
        };

        out.write_all(rendered.as_bytes())
            .and_then(|_| {
                if rendered.ends_with('\n') {
                    Ok(())
                } else {
                    out.write_all(b"\n")
                }
            })
            .map_err(|e| GateError::Serialization {
                reason: e.to_string(),
            })
    }
}

fn without_exceptions(results: &[EvaluationResult]) -> Vec<EvaluationResult> {
    results
        .iter()
        .map(|r| EvaluationResult {
            filename: r.filename.clone(),
            namespace: r.namespace.clone(),
            results: r
                .results
                .iter()
                .filter(|c| c.outcome != Outcome::Exception)
                .cloned()
                .collect(),
        })
        .collect()
}
