//! Assertion evaluation
//!
//! Evaluates one extracted value against one expected value. The operator
//! vocabulary is the closed [`AssertOperator`] enum, dispatched through a
//! single exhaustive match; each arm is pure and side-effect free. A type
//! error is fatal to the single assertion only and never aborts sibling
//! assertions in the same case.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use verity_domain::{AssertOperator, AssertionOutcome, AssertionSpec, ResponseSnapshot};

use crate::extractor;

/// Errors produced while evaluating an assertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertError {
    /// The operand types are incompatible with the operator.
    #[error("operator '{operator}' is not applicable: {detail}")]
    TypeMismatch {
        /// The operator symbol.
        operator: &'static str,
        /// What was wrong with the operands.
        detail: String,
    },

    /// The expected value is not a valid regex pattern.
    #[error("invalid regex pattern '{pattern}': {message}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// The parse error message.
        message: String,
    },
}

impl AssertError {
    fn mismatch(operator: AssertOperator, detail: impl Into<String>) -> Self {
        Self::TypeMismatch {
            operator: operator.symbol(),
            detail: detail.into(),
        }
    }
}

/// Evaluates `actual <operator> expected`.
///
/// # Errors
///
/// Returns [`AssertError::TypeMismatch`] when the operand types are
/// incompatible with the operator, and [`AssertError::InvalidRegex`] when a
/// `regex_match` pattern does not parse.
pub fn evaluate(
    actual: &Value,
    operator: AssertOperator,
    expected: &Value,
) -> Result<bool, AssertError> {
    match operator {
        AssertOperator::Equals => Ok(actual == expected),
        AssertOperator::NotEquals => Ok(actual != expected),
        AssertOperator::Contains => contains(actual, operator, expected),
        AssertOperator::NotContains => contains(actual, operator, expected).map(|found| !found),
        AssertOperator::GreaterThan => compare_numeric(actual, operator, expected, |a, b| a > b),
        AssertOperator::LessThan => compare_numeric(actual, operator, expected, |a, b| a < b),
        AssertOperator::GreaterThanOrEqual => {
            compare_numeric(actual, operator, expected, |a, b| a >= b)
        }
        AssertOperator::LessThanOrEqual => {
            compare_numeric(actual, operator, expected, |a, b| a <= b)
        }
        AssertOperator::RegexMatch => regex_match(actual, operator, expected),
        AssertOperator::IsNull => Ok(actual.is_null()),
        AssertOperator::IsNotNull => Ok(!actual.is_null()),
    }
}

/// Membership test: substring for strings, element for arrays, key for
/// objects.
fn contains(
    actual: &Value,
    operator: AssertOperator,
    expected: &Value,
) -> Result<bool, AssertError> {
    match actual {
        Value::String(haystack) => match expected {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(AssertError::mismatch(
                operator,
                format!("substring test requires a string expected value, got {other}"),
            )),
        },
        Value::Array(items) => Ok(items.contains(expected)),
        Value::Object(entries) => match expected {
            Value::String(key) => Ok(entries.contains_key(key)),
            other => Err(AssertError::mismatch(
                operator,
                format!("object key test requires a string expected value, got {other}"),
            )),
        },
        other => Err(AssertError::mismatch(
            operator,
            format!("actual value must be a string, array, or object, got {other}"),
        )),
    }
}

/// Numeric comparison; both operands must be numbers.
fn compare_numeric<F>(
    actual: &Value,
    operator: AssertOperator,
    expected: &Value,
    cmp: F,
) -> Result<bool, AssertError>
where
    F: Fn(f64, f64) -> bool,
{
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => Ok(cmp(a, b)),
        _ => Err(AssertError::mismatch(
            operator,
            format!("both operands must be numeric, got {actual} and {expected}"),
        )),
    }
}

/// Regex search; both operands must be strings. Passes when the pattern
/// matches anywhere in the actual string.
fn regex_match(
    actual: &Value,
    operator: AssertOperator,
    expected: &Value,
) -> Result<bool, AssertError> {
    let (Value::String(text), Value::String(pattern)) = (actual, expected) else {
        return Err(AssertError::mismatch(
            operator,
            format!("both operands must be strings, got {actual} and {expected}"),
        ));
    };

    let regex = Regex::new(pattern).map_err(|e| AssertError::InvalidRegex {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;
    Ok(regex.is_match(text))
}

/// Runs one assertion against a response snapshot: validates the spec,
/// extracts the actual value, evaluates the operator, and folds every
/// failure mode into the returned outcome.
#[must_use]
pub fn run_assertion(spec: &AssertionSpec, snapshot: &ResponseSnapshot) -> AssertionOutcome {
    if let Err(e) = spec.validate() {
        return AssertionOutcome::error(spec, e.to_string());
    }

    let actual = match extractor::extract(
        snapshot,
        spec.kind,
        spec.extract_key.as_deref(),
        spec.json_path.as_deref(),
    ) {
        Ok(value) => value,
        Err(e) => return AssertionOutcome::error(spec, e.to_string()),
    };

    let shown = value_text(&actual);
    match evaluate(&actual, spec.operator, &spec.expected) {
        Ok(true) => AssertionOutcome::pass(spec, shown),
        Ok(false) => AssertionOutcome::fail(
            spec,
            shown,
            format!(
                "expected {} {}, got {}",
                spec.operator.symbol(),
                spec.expected,
                actual
            ),
        ),
        Err(e) => AssertionOutcome::error(spec, e.to_string()),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
