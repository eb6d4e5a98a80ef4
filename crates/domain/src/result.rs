//! Per-case execution results.
//!
//! A [`CaseResult`] is created fresh for every case execution and is
//! immutable once returned; ownership passes to the run orchestrator, which
//! forwards it to the result sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assertion::AssertionOutcome;
use crate::case::CaseDefinition;
use crate::method::HttpMethod;
use crate::response::ResponseSnapshot;

/// Final classification of one case execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The response was received and every assertion passed.
    Success,
    /// The response was received but at least one assertion failed or
    /// could not be evaluated.
    Fail,
    /// The case was excluded before dispatch (disabled definition).
    Skip,
    /// The request could not be completed (unbound variable, missing case,
    /// transport failure).
    Error,
}

impl CaseOutcome {
    /// Returns the outcome as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The record of one case execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    /// Identifier of the executed case.
    pub case_id: Uuid,
    /// Case title at execution time.
    pub title: String,
    /// HTTP method actually dispatched.
    pub method: HttpMethod,
    /// URL actually dispatched, after variable substitution.
    pub url: String,
    /// Captured response; absent when the request never completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ResponseSnapshot>,
    /// Per-assertion outcomes; empty when no assertions ran.
    #[serde(default)]
    pub assertions: Vec<AssertionOutcome>,
    /// Case-level outcome.
    pub outcome: CaseOutcome,
    /// Causing error message for `error` outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution settled.
    pub ended_at: DateTime<Utc>,
    /// Elapsed wall-clock time in milliseconds.
    pub duration_ms: u64,
}

impl CaseResult {
    /// Builds a result for a case whose response was received and whose
    /// assertions all ran. The outcome is `Success` iff every assertion
    /// passed, `Fail` otherwise.
    #[must_use]
    pub fn completed(
        case: &CaseDefinition,
        url: impl Into<String>,
        snapshot: ResponseSnapshot,
        assertions: Vec<AssertionOutcome>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let outcome = if assertions.iter().all(|a| a.passed) {
            CaseOutcome::Success
        } else {
            CaseOutcome::Fail
        };

        Self {
            case_id: case.id,
            title: case.title.clone(),
            method: case.method,
            url: url.into(),
            snapshot: Some(snapshot),
            assertions,
            outcome,
            error: None,
            started_at,
            ended_at,
            duration_ms: elapsed_ms(started_at, ended_at),
        }
    }

    /// Builds a result for a case whose request could not be completed.
    /// No assertions are recorded; elapsed time runs up to the failure
    /// point.
    #[must_use]
    pub fn errored(
        case_id: Uuid,
        title: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id,
            title: title.into(),
            method,
            url: url.into(),
            snapshot: None,
            assertions: Vec::new(),
            outcome: CaseOutcome::Error,
            error: Some(error.into()),
            started_at,
            ended_at,
            duration_ms: elapsed_ms(started_at, ended_at),
        }
    }

    /// Builds a result for a case excluded before dispatch.
    #[must_use]
    pub fn skipped(case: &CaseDefinition, at: DateTime<Utc>) -> Self {
        Self {
            case_id: case.id,
            title: case.title.clone(),
            method: case.method,
            url: case.url.clone(),
            snapshot: None,
            assertions: Vec::new(),
            outcome: CaseOutcome::Skip,
            error: None,
            started_at: at,
            ended_at: at,
            duration_ms: 0,
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
