//! Run reports and outcome aggregation.
//!
//! A [`RunReport`] covers one invocation of "run N cases". It is created
//! pending, marked running when dispatch begins, and completed exactly once
//! with the final counts. No component other than the run orchestrator
//! mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::CaseOutcome;

/// Lifecycle state of a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Created but not yet dispatched.
    #[default]
    Pending,
    /// Cases are executing.
    Running,
    /// All cases settled and counts are final.
    Completed,
}

/// Counters of case outcomes for one run.
///
/// Aggregation is a commutative reduction: recording outcomes in any order
/// yields identical counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutcomeCounts {
    /// Cases where every assertion passed.
    pub success: u64,
    /// Cases with at least one failed assertion.
    pub fail: u64,
    /// Cases excluded before dispatch.
    pub skip: u64,
    /// Cases whose request could not be completed.
    pub error: u64,
}

impl OutcomeCounts {
    /// Increments the counter for one outcome.
    pub const fn record(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Success => self.success += 1,
            CaseOutcome::Fail => self.fail += 1,
            CaseOutcome::Skip => self.skip += 1,
            CaseOutcome::Error => self.error += 1,
        }
    }

    /// Total number of recorded cases.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.success + self.fail + self.skip + self.error
    }

    /// True when no case failed or errored.
    #[must_use]
    pub const fn all_green(&self) -> bool {
        self.fail == 0 && self.error == 0
    }
}

/// The report for one batch execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Unique identifier.
    pub id: Uuid,
    /// Identity of whoever triggered the run.
    pub executor: String,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// Final outcome counts; zero until completion.
    #[serde(default)]
    pub counts: OutcomeCounts,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Total elapsed wall-clock time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl RunReport {
    /// Creates a pending report.
    #[must_use]
    pub fn new(executor: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            executor: executor.into(),
            status: ReportStatus::Pending,
            counts: OutcomeCounts::default(),
            started_at,
            ended_at: None,
            duration_ms: None,
        }
    }

    /// Marks the report as running.
    pub const fn start(&mut self) {
        self.status = ReportStatus::Running;
    }

    /// Completes the report with final counts and timing. Called exactly
    /// once per run.
    pub const fn complete(
        &mut self,
        counts: OutcomeCounts,
        ended_at: DateTime<Utc>,
        duration_ms: u64,
    ) {
        self.status = ReportStatus::Completed;
        self.counts = counts;
        self.ended_at = Some(ended_at);
        self.duration_ms = Some(duration_ms);
    }

    /// True once the report has been finalized.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ReportStatus::Completed
    }
}
