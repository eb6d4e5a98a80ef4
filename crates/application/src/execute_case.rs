//! Single-case execution
//!
//! Drives one test case from definition to [`CaseResult`]: resolve the
//! request template, dispatch the HTTP call, capture the response, run
//! every assertion, classify the outcome. Assertion failures are encoded in
//! the outcome, never propagated as errors; every per-case failure mode
//! (missing case, unbound variable, transport failure) is converted to an
//! `error` outcome at this boundary so nothing escapes to the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use verity_domain::{Bindings, CaseDefinition, CaseResult, HttpMethod};

use crate::assertion::run_assertion;
use crate::ports::{
    CancellationReceiver, CaseStore, Clock, HttpTransport, RequestPlan, ResultStore,
};
use crate::resolver::{resolve_str, resolve_template};

/// Default per-call HTTP timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes individual test cases.
pub struct CaseExecutor {
    case_store: Arc<dyn CaseStore>,
    transport: Arc<dyn HttpTransport>,
    result_store: Arc<dyn ResultStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CaseExecutor {
    /// Creates a new executor with the default per-call timeout.
    #[must_use]
    pub fn new(
        case_store: Arc<dyn CaseStore>,
        transport: Arc<dyn HttpTransport>,
        result_store: Arc<dyn ResultStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            case_store,
            transport,
            result_store,
            clock,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-call HTTP timeout (builder pattern).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executes one case and returns its result.
    ///
    /// This never returns an error for assertion failures or per-case
    /// problems; every failure mode is folded into the result's outcome.
    /// The result is persisted through the result store before returning;
    /// a failed save is logged and does not change the outcome.
    pub async fn execute(&self, case_id: Uuid, run_bindings: &Bindings) -> CaseResult {
        let started_at = self.clock.now();

        let result = match self.case_store.get_case(case_id).await {
            Ok(case) => self.execute_loaded(&case, run_bindings, started_at).await,
            Err(e) => {
                tracing::warn!(%case_id, error = %e, "case could not be loaded");
                CaseResult::errored(
                    case_id,
                    String::new(),
                    HttpMethod::default(),
                    String::new(),
                    e.to_string(),
                    started_at,
                    self.clock.now(),
                )
            }
        };

        if let Err(e) = self.result_store.save(&result).await {
            tracing::warn!(case_id = %result.case_id, error = %e, "failed to persist case result");
        }

        result
    }

    /// Executes one case, resolving early if cancellation is signalled.
    ///
    /// A cancelled in-flight case settles as an `error` outcome and is
    /// persisted through the result store like any other result; a case
    /// that already settled keeps its result.
    pub async fn execute_with_cancellation(
        &self,
        case_id: Uuid,
        run_bindings: &Bindings,
        mut cancel: CancellationReceiver,
    ) -> CaseResult {
        tokio::select! {
            result = self.execute(case_id, run_bindings) => result,
            () = cancel.cancelled() => {
                tracing::info!(%case_id, "case cancelled");
                let now = self.clock.now();
                let result = CaseResult::errored(
                    case_id,
                    String::new(),
                    HttpMethod::default(),
                    String::new(),
                    "run cancelled",
                    now,
                    now,
                );
                if let Err(e) = self.result_store.save(&result).await {
                    tracing::warn!(%case_id, error = %e, "failed to persist cancelled case result");
                }
                result
            }
        }
    }

    async fn execute_loaded(
        &self,
        case: &CaseDefinition,
        run_bindings: &Bindings,
        started_at: DateTime<Utc>,
    ) -> CaseResult {
        if !case.enabled {
            tracing::info!(case_id = %case.id, title = %case.title, "case disabled, skipping");
            return CaseResult::skipped(case, started_at);
        }

        let assertions = match self.case_store.get_assertions(case.id).await {
            Ok(specs) => specs,
            Err(e) => return self.errored(case, &case.url, e.to_string(), started_at),
        };

        let bindings = merge_bindings(run_bindings, &case.variables);

        let url = match resolve_str(&case.url, &bindings) {
            Ok(url) => url,
            Err(e) => return self.errored(case, &case.url, e.to_string(), started_at),
        };

        let mut headers = std::collections::HashMap::with_capacity(case.headers.len());
        for (name, template) in &case.headers {
            match resolve_str(template, &bindings) {
                Ok(value) => {
                    headers.insert(name.clone(), value);
                }
                Err(e) => return self.errored(case, &url, e.to_string(), started_at),
            }
        }

        let body = match case
            .body
            .as_ref()
            .map(|template| resolve_template(template, &bindings))
            .transpose()
        {
            Ok(body) => body,
            Err(e) => return self.errored(case, &url, e.to_string(), started_at),
        };

        let plan = RequestPlan {
            method: case.method,
            url: url.clone(),
            headers,
            // Read-style methods never send a JSON body.
            body: if case.method.has_body() { body } else { None },
            timeout: self.timeout,
        };

        match self.transport.send(&plan).await {
            Ok(snapshot) => {
                let outcomes = assertions
                    .iter()
                    .map(|spec| run_assertion(spec, &snapshot))
                    .collect();
                let result = CaseResult::completed(
                    case,
                    url,
                    snapshot,
                    outcomes,
                    started_at,
                    self.clock.now(),
                );
                tracing::info!(case_id = %case.id, outcome = %result.outcome, "case settled");
                result
            }
            Err(e) => {
                tracing::warn!(case_id = %case.id, error = %e, "request failed");
                self.errored(case, &url, e.to_string(), started_at)
            }
        }
    }

    fn errored(
        &self,
        case: &CaseDefinition,
        url: &str,
        error: String,
        started_at: DateTime<Utc>,
    ) -> CaseResult {
        CaseResult::errored(
            case.id,
            case.title.clone(),
            case.method,
            url,
            error,
            started_at,
            self.clock.now(),
        )
    }
}

/// Merges run-level and case-level bindings; case-level values win on key
/// collision.
fn merge_bindings(run_bindings: &Bindings, case_bindings: &Bindings) -> Bindings {
    let mut merged = run_bindings.clone();
    for (name, value) in case_bindings {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{StoreError, TransportError, cancellation_pair};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use verity_domain::{
        AssertOperator, AssertionSpec, CaseOutcome, ResponseBody, ResponseSnapshot,
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

    /// Mock transport that records the plans it was given.
    struct MockTransport {
        response: Result<ResponseSnapshot, TransportError>,
        calls: AtomicUsize,
        last_plan: Mutex<Option<RequestPlan>>,
    }

    impl MockTransport {
        fn ok(snapshot: ResponseSnapshot) -> Self {
            Self {
                response: Ok(snapshot),
                calls: AtomicUsize::new(0),
                last_plan: Mutex::new(None),
            }
        }

        fn err(error: TransportError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
                last_plan: Mutex::new(None),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, plan: &RequestPlan) -> Result<ResponseSnapshot, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_plan.lock().unwrap() = Some(plan.clone());
            self.response.clone()
        }
    }

    #[derive(Default)]
    struct RecordingResultStore {
        saved: Mutex<Vec<CaseResult>>,
        fail_saves: bool,
    }

    #[async_trait]
    impl ResultStore for RecordingResultStore {
        async fn save(&self, result: &CaseResult) -> Result<(), StoreError> {
            if self.fail_saves {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.saved.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    fn ok_snapshot() -> ResponseSnapshot {
        ResponseSnapshot::new(
            200,
            HashMap::new(),
            HashMap::new(),
            ResponseBody::Json(json!({"ok": true})),
            Duration::from_millis(12),
        )
    }

    fn executor(
        store: MockCaseStore,
        transport: Arc<MockTransport>,
        results: Arc<RecordingResultStore>,
    ) -> CaseExecutor {
        CaseExecutor::new(
            Arc::new(store),
            transport,
            results,
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_success_end_to_end() {
        let case = CaseDefinition::new("Get item", HttpMethod::Get, "http://x/${id}")
            .with_variable("id", json!("42"));
        let case_id = case.id;
        let assertion = AssertionSpec::json(case_id, "$.ok", AssertOperator::Equals, json!(true));

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![assertion]),
            Arc::clone(&transport),
            Arc::clone(&results),
        );

        let result = exec.execute(case_id, &Bindings::new()).await;

        assert_eq!(result.outcome, CaseOutcome::Success);
        assert_eq!(result.url, "http://x/42");
        assert_eq!(result.assertions.len(), 1);
        assert!(result.assertions[0].passed);
        assert_eq!(results.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_runs_no_assertions() {
        let case = CaseDefinition::new("Down", HttpMethod::Get, "http://x/${id}")
            .with_variable("id", json!("42"));
        let case_id = case.id;
        let assertion = AssertionSpec::json(case_id, "$.ok", AssertOperator::Equals, json!(true));

        let transport = Arc::new(MockTransport::err(TransportError::ConnectionRefused {
            host: "x".to_string(),
        }));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![assertion]),
            Arc::clone(&transport),
            results,
        );

        let result = exec.execute(case_id, &Bindings::new()).await;

        assert_eq!(result.outcome, CaseOutcome::Error);
        assert!(result.assertions.is_empty());
        assert!(result.snapshot.is_none());
        assert!(result.error.as_deref().unwrap_or("").contains("refused"));
    }

    #[tokio::test]
    async fn test_failed_assertion_gives_fail_outcome() {
        let case = CaseDefinition::new("Check", HttpMethod::Get, "http://x/");
        let case_id = case.id;
        let assertion =
            AssertionSpec::status_code(case_id, AssertOperator::Equals, json!(201));

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![assertion]),
            transport,
            results,
        );

        let result = exec.execute(case_id, &Bindings::new()).await;
        assert_eq!(result.outcome, CaseOutcome::Fail);
        assert!(result.snapshot.is_some());
    }

    #[tokio::test]
    async fn test_unbound_variable_never_dispatches() {
        let case = CaseDefinition::new("Broken", HttpMethod::Get, "http://x/${missing}");
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            Arc::clone(&transport),
            results,
        );

        let result = exec.execute(case_id, &Bindings::new()).await;

        assert_eq!(result.outcome, CaseOutcome::Error);
        assert!(result.error.as_deref().unwrap_or("").contains("unbound"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_case_skips_before_dispatch() {
        let case = CaseDefinition::new("Off", HttpMethod::Get, "http://x/").disabled();
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            Arc::clone(&transport),
            Arc::clone(&results),
        );

        let result = exec.execute(case_id, &Bindings::new()).await;

        assert_eq!(result.outcome, CaseOutcome::Skip);
        assert_eq!(transport.call_count(), 0);
        // Skipped cases are still persisted.
        assert_eq!(results.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_case_is_error_outcome() {
        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(MockCaseStore::default(), transport, results);

        let result = exec.execute(Uuid::now_v7(), &Bindings::new()).await;
        assert_eq!(result.outcome, CaseOutcome::Error);
        assert!(result.error.as_deref().unwrap_or("").contains("not found"));
    }

    #[tokio::test]
    async fn test_case_bindings_override_run_bindings() {
        let case = CaseDefinition::new("Auth", HttpMethod::Get, "http://x/")
            .with_header("Authorization", "Bearer ${token}")
            .with_variable("token", json!("case-token"));
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            Arc::clone(&transport),
            results,
        );

        let mut run_bindings = Bindings::new();
        run_bindings.insert("token".to_string(), json!("run-token"));
        exec.execute(case_id, &run_bindings).await;

        let plan = transport.last_plan.lock().unwrap().clone().unwrap();
        assert_eq!(
            plan.headers.get("Authorization"),
            Some(&"Bearer case-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_never_sends_body() {
        let case = CaseDefinition::new("Get", HttpMethod::Get, "http://x/")
            .with_body(json!({"q": "term"}));
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            Arc::clone(&transport),
            results,
        );

        exec.execute(case_id, &Bindings::new()).await;
        let plan = transport.last_plan.lock().unwrap().clone().unwrap();
        assert!(plan.body.is_none());
    }

    #[tokio::test]
    async fn test_post_sends_resolved_body() {
        let case = CaseDefinition::new("Post", HttpMethod::Post, "http://x/")
            .with_body(json!({"name": "${name}"}))
            .with_variable("name", json!("alice"));
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore::default());
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            Arc::clone(&transport),
            results,
        );

        exec.execute(case_id, &Bindings::new()).await;
        let plan = transport.last_plan.lock().unwrap().clone().unwrap();
        assert_eq!(plan.body, Some(json!({"name": "alice"})));
    }

    #[tokio::test]
    async fn test_result_store_failure_keeps_outcome() {
        let case = CaseDefinition::new("Ping", HttpMethod::Get, "http://x/");
        let case_id = case.id;

        let transport = Arc::new(MockTransport::ok(ok_snapshot()));
        let results = Arc::new(RecordingResultStore {
            saved: Mutex::new(Vec::new()),
            fail_saves: true,
        });
        let exec = executor(
            MockCaseStore::default().with_case(case, vec![]),
            transport,
            results,
        );

        let result = exec.execute(case_id, &Bindings::new()).await;
        assert_eq!(result.outcome, CaseOutcome::Success);
    }

    #[tokio::test]
    async fn test_cancellation_resolves_to_error() {
        let case = CaseDefinition::new("Slow", HttpMethod::Get, "http://x/");
        let case_id = case.id;

        /// Transport that never responds.
        struct HangingTransport;

        #[async_trait]
        impl HttpTransport for HangingTransport {
            async fn send(&self, _plan: &RequestPlan) -> Result<ResponseSnapshot, TransportError> {
                std::future::pending().await
            }
        }

        let results = Arc::new(RecordingResultStore::default());
        let exec = CaseExecutor::new(
            Arc::new(MockCaseStore::default().with_case(case, vec![])),
            Arc::new(HangingTransport),
            Arc::clone(&results) as Arc<dyn ResultStore>,
            Arc::new(SystemClock),
        );

        let (token, receiver) = cancellation_pair();
        token.cancel();

        let result = exec
            .execute_with_cancellation(case_id, &Bindings::new(), receiver)
            .await;
        assert_eq!(result.outcome, CaseOutcome::Error);
        assert_eq!(result.error.as_deref(), Some("run cancelled"));

        // The cancelled case still reaches the result sink.
        let saved = results.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].case_id, case_id);
        assert_eq!(saved[0].outcome, CaseOutcome::Error);
    }
}
