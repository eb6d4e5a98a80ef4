//! Verity API test runner - Main Entry Point
//!
//! Loads a suite file, executes every case concurrently, prints the
//! per-case results and the run summary, and exits non-zero when any case
//! failed or errored.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use verity_application::{CaseExecutor, RunOrchestrator};
use verity_infrastructure::{
    MemoryCaseStore, MemoryReportStore, MemoryResultStore, ReqwestTransport, SystemClock,
};

mod suite;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(all_green) => {
            if all_green {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: verity <suite.json>")?;
    let suite = suite::load_suite(Path::new(&path))?;

    // Get configuration from environment
    let timeout_ms = std::env::var("VERITY_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    let executor_identity =
        std::env::var("VERITY_EXECUTOR").unwrap_or_else(|_| "verity-cli".to_string());

    tracing::info!(
        suite = %suite.name,
        cases = suite.cases.len(),
        "starting Verity v{}",
        env!("CARGO_PKG_VERSION")
    );

    let case_store = Arc::new(MemoryCaseStore::new());
    let results = Arc::new(MemoryResultStore::new());
    let reports = Arc::new(MemoryReportStore::new());
    let clock = Arc::new(SystemClock::new());

    let (variables, case_ids) = suite::seed(&case_store, suite).await;

    let executor = CaseExecutor::new(
        case_store,
        Arc::new(ReqwestTransport::new()?),
        Arc::clone(&results) as _,
        Arc::clone(&clock) as _,
    )
    .with_timeout(Duration::from_millis(timeout_ms));
    let orchestrator = RunOrchestrator::new(Arc::new(executor), reports, clock);

    let report = orchestrator.run(executor_identity, &case_ids, variables).await?;

    for result in results.all().await {
        match &result.error {
            Some(error) => println!("[{}] {} ({error})", result.outcome, result.title),
            None => println!(
                "[{}] {} ({} ms)",
                result.outcome, result.title, result.duration_ms
            ),
        }
    }

    let counts = report.counts;
    println!(
        "{} cases: {} success, {} fail, {} skip, {} error ({} ms)",
        counts.total(),
        counts.success,
        counts.fail,
        counts.skip,
        counts.error,
        report.duration_ms.unwrap_or(0)
    );

    Ok(counts.all_green())
}
