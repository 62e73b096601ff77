//! Binding query parameters to report parameter values.
//!
//! A dataset declares its query parameters as `(name, value expression)`
//! pairs. The only supported expression is a direct reference to a report
//! parameter's value:
//!
//! ```text
//! =Parameters!<name>.Value
//! ```
//!
//! Binding extracts `<name>`, looks it up in the caller's [`ReportParameters`]
//! and produces a [`BoundParameter`] carrying the *query* parameter's name and
//! the report parameter's first value. Multi-value report parameters bind
//! their first value only.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::definition::{QueryParameterBinding, ReportParameterCatalog};
use crate::engine::BoundParameter;
use crate::error::{ReportError, ReportResult};

/// `=Parameters!<name>.Value`, with a non-empty name.
static EXPRESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^=Parameters!(.+)\.Value$").unwrap());

/// Extract the report parameter name referenced by a value expression.
pub fn parse_expression(expression: &str) -> ReportResult<&str> {
    EXPRESSION_PATTERN
        .captures(expression)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str())
        .ok_or_else(|| ReportError::UnparsableExpression(expression.to_string()))
}

/// Bind one query parameter against the supplied report parameters.
pub fn bind(
    binding: &QueryParameterBinding,
    params: &ReportParameters,
) -> ReportResult<BoundParameter> {
    let parameter = parse_expression(&binding.value_expression)?;
    let value = params
        .first_value(parameter)
        .ok_or_else(|| ReportError::MissingParameterValue(parameter.to_string()))?;

    Ok(BoundParameter {
        name: binding.name.clone(),
        value: value.to_string(),
    })
}

/// Bind every query parameter of a dataset, stopping at the first failure.
pub fn bind_all(
    bindings: &[QueryParameterBinding],
    params: &ReportParameters,
) -> ReportResult<Vec<BoundParameter>> {
    bindings.iter().map(|binding| bind(binding, params)).collect()
}

/// Report parameter values supplied by the caller, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportParameters {
    values: BTreeMap<String, Vec<String>>,
}

impl ReportParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed values from each declared parameter's defaults.
    ///
    /// Parameters without defaults, or whose defaults include an expression,
    /// are left unset.
    pub fn from_defaults(catalog: &ReportParameterCatalog) -> Self {
        let mut params = Self::new();
        for definition in catalog {
            if definition.has_literal_default() {
                params.set(&definition.name, definition.default_values.clone());
            }
        }
        params
    }

    /// Replace the values of a parameter.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) -> &mut Self {
        self.values.insert(name.into(), values);
        self
    }

    /// Replace a parameter with a single value.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set(name, vec![value.into()])
    }

    /// Builder form of [`set_value`](Self::set_value).
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(name, value);
        self
    }

    /// Overlay another set of values; parameters present in `other` win.
    pub fn merge(&mut self, other: ReportParameters) {
        self.values.extend(other.values);
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// First value of a parameter, or `None` when absent or empty.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name)?.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from `NAME=VALUE` assignments. A repeated name collects values
    /// in order.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (name, value) = assignment
                .split_once('=')
                .ok_or_else(|| format!("expected NAME=VALUE, got '{assignment}'"))?;
            if name.is_empty() {
                return Err(format!("missing parameter name in '{assignment}'"));
            }
            params
                .values
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        Ok(params)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ReportParameters {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set_value(name, value);
        }
        params
    }
}
