//! Verity Application - Test execution engine
//!
//! This crate holds the engine itself: variable resolution, response value
//! extraction, assertion evaluation, single-case execution, and concurrent
//! run orchestration. External concerns (HTTP, persistence, time) are
//! reached through the port traits in [`ports`].

pub mod assertion;
pub mod execute_case;
pub mod extractor;
pub mod ports;
pub mod resolver;
pub mod run_cases;

pub use assertion::{AssertError, evaluate, run_assertion};
pub use execute_case::CaseExecutor;
pub use extractor::{ExtractError, extract};
pub use ports::{
    CancellationReceiver, CancellationToken, CaseStore, Clock, HttpTransport, ReportStore,
    RequestPlan, ResultStore, StoreError, TransportError, cancellation_pair,
};
pub use resolver::{ResolveError, resolve_str, resolve_template};
pub use run_cases::{RunError, RunOrchestrator};
