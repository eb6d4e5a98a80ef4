//! Persistence ports
//!
//! The engine never owns storage; cases and assertions are read through
//! [`CaseStore`], reports are written through [`ReportStore`], and per-case
//! results go to [`ResultStore`] independently of report finalization.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use verity_domain::{AssertionSpec, CaseDefinition, CaseResult, RunReport};

/// Errors surfaced by the persistence collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The record type ("case", "report").
        entity: &'static str,
        /// The unknown identifier.
        id: Uuid,
    },

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Port for reading test case definitions and their assertions.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Fetches one case definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id; the engine maps
    /// this to an `error` outcome rather than crashing.
    async fn get_case(&self, id: Uuid) -> Result<CaseDefinition, StoreError>;

    /// Fetches all assertions attached to a case. A case with no
    /// assertions yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the store cannot be read.
    async fn get_assertions(&self, case_id: Uuid) -> Result<Vec<AssertionSpec>, StoreError>;
}

/// Port for report bookkeeping.
///
/// The engine calls [`ReportStore::update`] exactly twice per run: once
/// when the run starts and once at completion.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists a newly created report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the report cannot be written.
    async fn create(&self, report: &RunReport) -> Result<(), StoreError>;

    /// Persists the current state of an existing report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown report and
    /// [`StoreError::Backend`] when the write fails.
    async fn update(&self, report: &RunReport) -> Result<(), StoreError>;
}

/// Port for persisting per-case results.
///
/// Called once per case, independent of report finalization, so a crash
/// between a per-case save and report completion loses no saved results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists one case result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the write fails.
    async fn save(&self, result: &CaseResult) -> Result<(), StoreError>;
}
