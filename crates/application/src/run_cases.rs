//! Concurrent run orchestration
//!
//! A run executes a batch of cases concurrently, one task per case, and
//! aggregates their outcomes into a [`RunReport`]. The report is persisted
//! at creation, updated once when the run starts and once at completion,
//! and per-case results are persisted by the executor as each case settles.
//! Count aggregation is commutative, so task completion order never changes
//! the final report.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use uuid::Uuid;
use verity_domain::{Bindings, CaseOutcome, OutcomeCounts, RunReport};

use crate::execute_case::CaseExecutor;
use crate::ports::{CancellationReceiver, Clock, ReportStore, StoreError, cancellation_pair};

/// Errors that abort an entire run.
///
/// Only report bookkeeping can fail a run; individual case failures are
/// absorbed into the counts.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run report could not be persisted.
    #[error(transparent)]
    Report(#[from] StoreError),
}

/// Executes batches of cases and maintains their run report.
pub struct RunOrchestrator {
    executor: Arc<CaseExecutor>,
    report_store: Arc<dyn ReportStore>,
    clock: Arc<dyn Clock>,
}

impl RunOrchestrator {
    /// Creates a new orchestrator.
    #[must_use]
    pub fn new(
        executor: Arc<CaseExecutor>,
        report_store: Arc<dyn ReportStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            executor,
            report_store,
            clock,
        }
    }

    /// Runs a batch of cases to completion and returns the final report.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Report`] when the run report cannot be persisted;
    /// per-case failures never abort the run.
    pub async fn run(
        &self,
        executor_identity: impl Into<String> + Send,
        case_ids: &[Uuid],
        run_bindings: Bindings,
    ) -> Result<RunReport, RunError> {
        // Dropping the token means cancellation is never signalled.
        let (_token, receiver) = cancellation_pair();
        self.run_with_cancellation(executor_identity, case_ids, run_bindings, receiver)
            .await
    }

    /// Runs a batch of cases, resolving in-flight cases early if
    /// cancellation is signalled. Cases that already settled keep their
    /// results; the report still completes with the aggregated counts.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Report`] when the run report cannot be persisted.
    pub async fn run_with_cancellation(
        &self,
        executor_identity: impl Into<String> + Send,
        case_ids: &[Uuid],
        run_bindings: Bindings,
        cancel: CancellationReceiver,
    ) -> Result<RunReport, RunError> {
        let started = std::time::Instant::now();

        let mut report = RunReport::new(executor_identity, self.clock.now());
        self.report_store.create(&report).await?;

        report.start();
        self.report_store.update(&report).await?;
        tracing::info!(report_id = %report.id, cases = case_ids.len(), "run started");

        let bindings = Arc::new(run_bindings);
        let mut tasks = JoinSet::new();
        for &case_id in case_ids {
            let executor = Arc::clone(&self.executor);
            let bindings = Arc::clone(&bindings);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                executor
                    .execute_with_cancellation(case_id, &bindings, cancel)
                    .await
            });
        }

        let mut counts = OutcomeCounts::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    tracing::debug!(
                        case_id = %result.case_id,
                        outcome = %result.outcome,
                        "case joined"
                    );
                    counts.record(result.outcome);
                }
                // A panicked task still counts; no case may vanish from the
                // aggregate.
                Err(e) => {
                    tracing::error!(error = %e, "case task aborted");
                    counts.record(CaseOutcome::Error);
                }
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;
        report.complete(counts, self.clock.now(), duration_ms);
        self.report_store.update(&report).await?;
        tracing::info!(
            report_id = %report.id,
            success = counts.success,
            fail = counts.fail,
            skip = counts.skip,
            error = counts.error,
            duration_ms,
            "run completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        CaseStore, HttpTransport, RequestPlan, ResultStore, TransportError,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use verity_domain::{
        AssertOperator, AssertionSpec, CaseDefinition, CaseResult, HttpMethod, ReportStatus,
        ResponseBody, ResponseSnapshot,
    };

    struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    #[derive(Default)]
    struct MockCaseStore {
        cases: HashMap<Uuid, CaseDefinition>,
        assertions: HashMap<Uuid, Vec<AssertionSpec>>,
    }

    impl MockCaseStore {
        fn with_case(mut self, case: CaseDefinition, assertions: Vec<AssertionSpec>) -> Self {
            self.assertions.insert(case.id, assertions);
            self.cases.insert(case.id, case);
            self
        }
    }

    #[async_trait]
    impl CaseStore for MockCaseStore {
        async fn get_case(&self, id: Uuid) -> Result<CaseDefinition, StoreError> {
            self.cases
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound { entity: "case", id })
        }

        async fn get_assertions(&self, case_id: Uuid) -> Result<Vec<AssertionSpec>, StoreError> {
            Ok(self.assertions.get(&case_id).cloned().unwrap_or_default())
        }
    }

    /// Transport scripted per URL: success, a transport error, a panic, or
    /// a hang until cancellation.
    #[derive(Default)]
    struct ScriptedTransport {
        failures: HashMap<String, TransportError>,
        panics: Vec<String>,
        hangs: Vec<String>,
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, plan: &RequestPlan) -> Result<ResponseSnapshot, TransportError> {
            if let Some(error) = self.failures.get(&plan.url) {
                return Err(error.clone());
            }
            if self.panics.contains(&plan.url) {
                panic!("scripted panic for {}", plan.url);
            }
            if self.hangs.contains(&plan.url) {
                std::future::pending::<()>().await;
            }
            Ok(ResponseSnapshot::new(
                200,
                HashMap::new(),
                HashMap::new(),
                ResponseBody::Json(json!({"ok": true})),
                Duration::from_millis(5),
            ))
        }
    }

    #[derive(Default)]
    struct MockResultStore {
        saved: Mutex<Vec<CaseResult>>,
    }

    #[async_trait]
    impl ResultStore for MockResultStore {
        async fn save(&self, result: &CaseResult) -> Result<(), StoreError> {
            self.saved.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockReportStore {
        created: Mutex<Vec<RunReport>>,
        updated: Mutex<Vec<RunReport>>,
    }

    #[async_trait]
    impl ReportStore for MockReportStore {
        async fn create(&self, report: &RunReport) -> Result<(), StoreError> {
            self.created.lock().unwrap().push(report.clone());
            Ok(())
        }

        async fn update(&self, report: &RunReport) -> Result<(), StoreError> {
            self.updated.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn orchestrator(
        store: MockCaseStore,
        transport: ScriptedTransport,
        reports: Arc<MockReportStore>,
    ) -> RunOrchestrator {
        let executor = CaseExecutor::new(
            Arc::new(store),
            Arc::new(transport),
            Arc::new(MockResultStore::default()),
            Arc::new(SystemClock),
        );
        RunOrchestrator::new(Arc::new(executor), reports, Arc::new(SystemClock))
    }

    fn ok_case(url: &str) -> (CaseDefinition, Vec<AssertionSpec>) {
        let case = CaseDefinition::new(url, HttpMethod::Get, url);
        let spec = AssertionSpec::status_code(case.id, AssertOperator::Equals, json!(200));
        (case, vec![spec])
    }

    #[tokio::test]
    async fn test_mixed_batch_counts() {
        let (case_a, asserts_a) = ok_case("http://x/a");
        let (case_b, asserts_b) = ok_case("http://x/b");
        let (case_c, asserts_c) = ok_case("http://x/c");
        let ids = vec![case_a.id, case_b.id, case_c.id];

        let store = MockCaseStore::default()
            .with_case(case_a, asserts_a)
            .with_case(case_b, asserts_b)
            .with_case(case_c, asserts_c);
        let mut transport = ScriptedTransport::default();
        transport.failures.insert(
            "http://x/b".to_string(),
            TransportError::Timeout { timeout_ms: 30_000 },
        );

        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(store, transport, Arc::clone(&reports));

        let report = orch
            .run("ci-bot", &ids, Bindings::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.counts.success, 2);
        assert_eq!(report.counts.error, 1);
        assert_eq!(report.counts.fail, 0);
        assert_eq!(report.counts.total(), 3);
        assert!(report.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_report_persisted_exactly_three_times() {
        let (case, asserts) = ok_case("http://x/a");
        let ids = vec![case.id];

        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(
            MockCaseStore::default().with_case(case, asserts),
            ScriptedTransport::default(),
            Arc::clone(&reports),
        );

        orch.run("ci-bot", &ids, Bindings::new()).await.unwrap();

        let created = reports.created.lock().unwrap();
        let updated = reports.updated.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, ReportStatus::Pending);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].status, ReportStatus::Running);
        assert_eq!(updated[1].status, ReportStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_batch_completes_with_zero_counts() {
        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(
            MockCaseStore::default(),
            ScriptedTransport::default(),
            Arc::clone(&reports),
        );

        let report = orch.run("ci-bot", &[], Bindings::new()).await.unwrap();

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.counts.total(), 0);
        assert!(report.counts.all_green());
    }

    #[tokio::test]
    async fn test_unknown_case_counts_as_error() {
        let (case, asserts) = ok_case("http://x/a");
        let ids = vec![case.id, Uuid::now_v7()];

        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(
            MockCaseStore::default().with_case(case, asserts),
            ScriptedTransport::default(),
            Arc::clone(&reports),
        );

        let report = orch.run("ci-bot", &ids, Bindings::new()).await.unwrap();
        assert_eq!(report.counts.success, 1);
        assert_eq!(report.counts.error, 1);
    }

    #[tokio::test]
    async fn test_panicked_case_still_counted() {
        let (case_a, asserts_a) = ok_case("http://x/a");
        let (case_b, asserts_b) = ok_case("http://x/boom");
        let ids = vec![case_a.id, case_b.id];

        let store = MockCaseStore::default()
            .with_case(case_a, asserts_a)
            .with_case(case_b, asserts_b);
        let mut transport = ScriptedTransport::default();
        transport.panics.push("http://x/boom".to_string());

        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(store, transport, Arc::clone(&reports));

        let report = orch.run("ci-bot", &ids, Bindings::new()).await.unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.counts.success, 1);
        assert_eq!(report.counts.error, 1);
        assert_eq!(report.counts.total(), 2);
    }

    #[tokio::test]
    async fn test_counts_are_order_independent() {
        let (case_a, asserts_a) = ok_case("http://x/a");
        let (case_b, asserts_b) = ok_case("http://x/b");
        let (case_c, asserts_c) = ok_case("http://x/c");
        let forward = vec![case_a.id, case_b.id, case_c.id];
        let reversed: Vec<Uuid> = forward.iter().rev().copied().collect();

        let build = |reports: Arc<MockReportStore>| {
            let store = MockCaseStore::default()
                .with_case(case_a.clone(), asserts_a.clone())
                .with_case(case_b.clone(), asserts_b.clone())
                .with_case(case_c.clone(), asserts_c.clone());
            let mut transport = ScriptedTransport::default();
            transport.failures.insert(
                "http://x/c".to_string(),
                TransportError::ConnectionFailed("reset".to_string()),
            );
            orchestrator(store, transport, reports)
        };

        let first = build(Arc::new(MockReportStore::default()))
            .run("ci-bot", &forward, Bindings::new())
            .await
            .unwrap();
        let second = build(Arc::new(MockReportStore::default()))
            .run("ci-bot", &reversed, Bindings::new())
            .await
            .unwrap();

        assert_eq!(first.counts, second.counts);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_settled_results() {
        let (case_fast, asserts_fast) = ok_case("http://x/fast");
        let (case_slow, asserts_slow) = ok_case("http://x/slow");
        let ids = vec![case_fast.id, case_slow.id];

        let store = MockCaseStore::default()
            .with_case(case_fast, asserts_fast)
            .with_case(case_slow, asserts_slow);
        let mut transport = ScriptedTransport::default();
        transport.hangs.push("http://x/slow".to_string());

        let reports = Arc::new(MockReportStore::default());
        let orch = orchestrator(store, transport, Arc::clone(&reports));

        let (token, receiver) = cancellation_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let report = orch
            .run_with_cancellation("ci-bot", &ids, Bindings::new(), receiver)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.counts.success, 1);
        assert_eq!(report.counts.error, 1);
    }
}
