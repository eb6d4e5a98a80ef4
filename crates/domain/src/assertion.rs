//! Assertion specifications and per-assertion outcomes.
//!
//! An [`AssertionSpec`] belongs to exactly one test case and describes where
//! to read a value from the response ([`ExtractionKind`]), how to compare it
//! ([`AssertOperator`]), and the expected value. Evaluation itself lives in
//! the application layer; this module only carries the declarative shape and
//! its consistency rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Where an assertion reads its actual value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    /// The integer HTTP status code.
    StatusCode,
    /// A response header value; requires `extract_key`.
    Header,
    /// A response cookie value; requires `extract_key`.
    Cookie,
    /// A value inside a JSON body; requires `json_path`.
    Json,
    /// The raw text body.
    Text,
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StatusCode => "status_code",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Json => "json",
            Self::Text => "text",
        };
        write!(f, "{name}")
    }
}

/// Comparison operators for assertions.
///
/// The vocabulary is closed: every operator is matched exhaustively at
/// evaluation time, so an unknown operator is rejected when the spec is
/// deserialized rather than at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertOperator {
    /// Structural equality.
    Equals,
    /// Structural inequality.
    NotEquals,
    /// Substring, array element, or object key membership.
    Contains,
    /// Negated membership.
    NotContains,
    /// Numeric greater-than.
    GreaterThan,
    /// Numeric less-than.
    LessThan,
    /// Numeric greater-than-or-equal.
    GreaterThanOrEqual,
    /// Numeric less-than-or-equal.
    LessThanOrEqual,
    /// Expected is a regex pattern; passes when it matches anywhere in the
    /// actual string.
    RegexMatch,
    /// Actual is null; the expected value is ignored.
    IsNull,
    /// Actual is not null; the expected value is ignored.
    IsNotNull,
}

impl AssertOperator {
    /// Returns the display symbol for this operator.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Contains => "contains",
            Self::NotContains => "not contains",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::RegexMatch => "matches",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }

    /// Returns true for operators that ignore the expected value.
    #[must_use]
    pub const fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// One assertion attached to a test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionSpec {
    /// Unique identifier.
    #[serde(default = "generate_id")]
    pub id: Uuid,
    /// Identifier of the owning case.
    pub case_id: Uuid,
    /// Where to read the actual value from.
    pub kind: ExtractionKind,
    /// Header or cookie name; required for those kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_key: Option<String>,
    /// Dotted JSON path (optionally `$.`-prefixed); required for `json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Comparison operator.
    pub operator: AssertOperator,
    /// Expected value; ignored by unary operators.
    #[serde(default)]
    pub expected: Value,
}

fn generate_id() -> Uuid {
    Uuid::now_v7()
}

impl AssertionSpec {
    /// Creates a new assertion for the given case.
    #[must_use]
    pub fn new(case_id: Uuid, kind: ExtractionKind, operator: AssertOperator, expected: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            case_id,
            kind,
            extract_key: None,
            json_path: None,
            operator,
            expected,
        }
    }

    /// Creates a status-code assertion.
    #[must_use]
    pub fn status_code(case_id: Uuid, operator: AssertOperator, expected: Value) -> Self {
        Self::new(case_id, ExtractionKind::StatusCode, operator, expected)
    }

    /// Creates a header assertion.
    #[must_use]
    pub fn header(
        case_id: Uuid,
        name: impl Into<String>,
        operator: AssertOperator,
        expected: Value,
    ) -> Self {
        let mut spec = Self::new(case_id, ExtractionKind::Header, operator, expected);
        spec.extract_key = Some(name.into());
        spec
    }

    /// Creates a cookie assertion.
    #[must_use]
    pub fn cookie(
        case_id: Uuid,
        name: impl Into<String>,
        operator: AssertOperator,
        expected: Value,
    ) -> Self {
        let mut spec = Self::new(case_id, ExtractionKind::Cookie, operator, expected);
        spec.extract_key = Some(name.into());
        spec
    }

    /// Creates a JSON-path assertion.
    #[must_use]
    pub fn json(
        case_id: Uuid,
        path: impl Into<String>,
        operator: AssertOperator,
        expected: Value,
    ) -> Self {
        let mut spec = Self::new(case_id, ExtractionKind::Json, operator, expected);
        spec.json_path = Some(path.into());
        spec
    }

    /// Creates a raw-text-body assertion.
    #[must_use]
    pub fn text(case_id: Uuid, operator: AssertOperator, expected: Value) -> Self {
        Self::new(case_id, ExtractionKind::Text, operator, expected)
    }

    /// Checks that the extraction kind is consistent with the presence of
    /// `extract_key` / `json_path`.
    ///
    /// A violation is a configuration error, not a runtime assertion
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidAssertion`] when a header or cookie
    /// assertion has no key, or a JSON assertion has no path.
    pub fn validate(&self) -> DomainResult<()> {
        match self.kind {
            ExtractionKind::Header | ExtractionKind::Cookie => {
                if self.extract_key.as_deref().is_none_or(str::is_empty) {
                    return Err(DomainError::InvalidAssertion(format!(
                        "{} assertion requires extract_key",
                        self.kind
                    )));
                }
            }
            ExtractionKind::Json => {
                if self.json_path.as_deref().is_none_or(str::is_empty) {
                    return Err(DomainError::InvalidAssertion(
                        "json assertion requires json_path".to_string(),
                    ));
                }
            }
            ExtractionKind::StatusCode | ExtractionKind::Text => {}
        }
        Ok(())
    }

    /// Returns a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        let target = match self.kind {
            ExtractionKind::StatusCode => "status_code".to_string(),
            ExtractionKind::Header => {
                format!("header '{}'", self.extract_key.as_deref().unwrap_or(""))
            }
            ExtractionKind::Cookie => {
                format!("cookie '{}'", self.extract_key.as_deref().unwrap_or(""))
            }
            ExtractionKind::Json => {
                format!("json '{}'", self.json_path.as_deref().unwrap_or(""))
            }
            ExtractionKind::Text => "text body".to_string(),
        };

        if self.operator.is_unary() {
            format!("{target} {}", self.operator.symbol())
        } else {
            format!("{target} {} {}", self.operator.symbol(), self.expected)
        }
    }
}

/// Outcome of evaluating one assertion against a response snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionOutcome {
    /// Identifier of the evaluated assertion.
    pub assertion_id: Uuid,
    /// Human-readable description of what was checked.
    pub description: String,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Actual value found, for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Error message when the assertion failed or could not be evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssertionOutcome {
    /// Creates a passed outcome with the actual value.
    #[must_use]
    pub fn pass(spec: &AssertionSpec, actual: impl Into<String>) -> Self {
        Self {
            assertion_id: spec.id,
            description: spec.description(),
            passed: true,
            actual: Some(actual.into()),
            error: None,
        }
    }

    /// Creates a failed outcome with the actual value and a reason.
    #[must_use]
    pub fn fail(spec: &AssertionSpec, actual: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            assertion_id: spec.id,
            description: spec.description(),
            passed: false,
            actual: Some(actual.into()),
            error: Some(error.into()),
        }
    }

    /// Creates a failed outcome for an assertion that could not be
    /// evaluated at all (extraction or type error).
    #[must_use]
    pub fn error(spec: &AssertionSpec, error: impl Into<String>) -> Self {
        Self {
            assertion_id: spec.id,
            description: spec.description(),
            passed: false,
            actual: None,
            error: Some(error.into()),
        }
    }
}
