//! Namespaced policy names.

use std::fmt;

use crate::error::{GateError, GateResult};

/// Separator between namespace and name.
pub const SEPARATOR: char = '/';

/// A policy configuration address: `namespace/name` or bare `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyName {
    pub namespace: String,
    pub name: String,
}

impl PolicyName {
    /// Parse a user supplied policy identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use provgate_core::PolicyName;
    ///
    /// let name = PolicyName::parse("tenant/release").unwrap();
    /// assert_eq!(name.namespace, "tenant");
    /// assert_eq!(name.name, "release");
    ///
    /// let bare = PolicyName::parse("release").unwrap();
    /// assert_eq!(bare.namespace, "");
    /// ```
    pub fn parse(input: &str) -> GateResult<Self> {
        if input.is_empty() {
            return Err(GateError::missing("policy name"));
        }

        let parsed = match input.split_once(SEPARATOR) {
            Some((namespace, name)) => Self {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            None => Self {
                namespace: String::new(),
                name: input.to_string(),
            },
        };

        if parsed.name.is_empty() {
            return Err(GateError::missing("policy name"));
        }

        Ok(parsed)
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }
}

impl fmt::Display for PolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_namespace() {
            write!(f, "{}{}{}", self.namespace, SEPARATOR, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl std::str::FromStr for PolicyName {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
