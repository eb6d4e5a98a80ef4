//! In-memory store implementations.
//!
//! These back the persistence ports with `RwLock`-guarded maps. They are
//! the stores used by the CLI runner, where case definitions are loaded
//! from a suite file at startup, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use verity_application::ports::{CaseStore, ReportStore, ResultStore, StoreError};
use verity_domain::{AssertionSpec, CaseDefinition, CaseResult, RunReport};

/// In-memory case and assertion store.
#[derive(Default)]
pub struct MemoryCaseStore {
    cases: RwLock<HashMap<Uuid, CaseDefinition>>,
    assertions: RwLock<HashMap<Uuid, Vec<AssertionSpec>>>,
}

impl MemoryCaseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a case definition.
    pub async fn insert_case(&self, case: CaseDefinition) {
        self.cases.write().await.insert(case.id, case);
    }

    /// Attaches an assertion to its case.
    pub async fn insert_assertion(&self, spec: AssertionSpec) {
        self.assertions
            .write()
            .await
            .entry(spec.case_id)
            .or_default()
            .push(spec);
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn get_case(&self, id: Uuid) -> Result<CaseDefinition, StoreError> {
        self.cases
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "case", id })
    }

    async fn get_assertions(&self, case_id: Uuid) -> Result<Vec<AssertionSpec>, StoreError> {
        Ok(self
            .assertions
            .read()
            .await
            .get(&case_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory run report store.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<Uuid, RunReport>>,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a report by id, if present.
    pub async fn get(&self, id: Uuid) -> Option<RunReport> {
        self.reports.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn create(&self, report: &RunReport) -> Result<(), StoreError> {
        self.reports
            .write()
            .await
            .insert(report.id, report.clone());
        Ok(())
    }

    async fn update(&self, report: &RunReport) -> Result<(), StoreError> {
        let mut reports = self.reports.write().await;
        if !reports.contains_key(&report.id) {
            return Err(StoreError::NotFound {
                entity: "report",
                id: report.id,
            });
        }
        reports.insert(report.id, report.clone());
        Ok(())
    }
}

/// In-memory case result sink.
#[derive(Default)]
pub struct MemoryResultStore {
    results: RwLock<Vec<CaseResult>>,
}

impl MemoryResultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every saved result, in save order.
    pub async fn all(&self) -> Vec<CaseResult> {
        self.results.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, result: &CaseResult) -> Result<(), StoreError> {
        self.results.write().await.push(result.clone());
        Ok(())
    }
}
