//! Suite file loading.
//!
//! A suite file is a JSON document describing run-level variables and a
//! list of cases with their assertions inline. Loading a suite seeds the
//! in-memory case store that the engine reads from.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;
use verity_domain::{
    AssertOperator, AssertionSpec, Bindings, CaseDefinition, ExtractionKind, HttpMethod,
};
use verity_infrastructure::MemoryCaseStore;

/// Errors while loading a suite file.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The file could not be read.
    #[error("failed to read suite file {path}: {source}")]
    Read {
        /// Path of the suite file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid suite JSON.
    #[error("failed to parse suite file {path}: {source}")]
    Parse {
        /// Path of the suite file.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// A parsed suite file.
#[derive(Debug, Deserialize)]
pub struct SuiteFile {
    /// Suite name, for display only.
    #[serde(default)]
    pub name: String,
    /// Run-level variable bindings; case-level bindings override these.
    #[serde(default)]
    pub variables: Bindings,
    /// The cases to run.
    pub cases: Vec<SuiteCase>,
}

/// One case entry in a suite file.
#[derive(Debug, Deserialize)]
pub struct SuiteCase {
    /// Case title.
    pub title: String,
    /// HTTP method; GET when omitted.
    #[serde(default)]
    pub method: HttpMethod,
    /// URL template.
    pub url: String,
    /// Header templates.
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    /// Optional body template.
    #[serde(default)]
    pub body: Option<Value>,
    /// Case-scoped variable bindings.
    #[serde(default)]
    pub variables: Bindings,
    /// Disabled cases are counted as skipped.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Assertions to evaluate against the response.
    #[serde(default)]
    pub assertions: Vec<SuiteAssertion>,
}

const fn enabled_default() -> bool {
    true
}

/// One assertion entry; the owning case id is assigned at seed time.
#[derive(Debug, Deserialize)]
pub struct SuiteAssertion {
    /// Where to read the actual value from.
    pub kind: ExtractionKind,
    /// Header or cookie name.
    #[serde(default)]
    pub extract_key: Option<String>,
    /// Dotted JSON path.
    #[serde(default)]
    pub json_path: Option<String>,
    /// Comparison operator.
    pub operator: AssertOperator,
    /// Expected value.
    #[serde(default)]
    pub expected: Value,
}

impl SuiteAssertion {
    fn into_spec(self, case_id: Uuid) -> AssertionSpec {
        let mut spec = AssertionSpec::new(case_id, self.kind, self.operator, self.expected);
        spec.extract_key = self.extract_key;
        spec.json_path = self.json_path;
        spec
    }
}

/// Reads and parses a suite file.
///
/// # Errors
///
/// Returns [`SuiteError::Read`] when the file cannot be read and
/// [`SuiteError::Parse`] when it is not valid suite JSON.
pub fn load_suite(path: &Path) -> Result<SuiteFile, SuiteError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| SuiteError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SuiteError::Parse {
        path: display,
        source,
    })
}

/// Seeds the case store from a suite and returns the case ids in suite
/// order.
pub async fn seed(store: &MemoryCaseStore, suite: SuiteFile) -> (Bindings, Vec<Uuid>) {
    let mut case_ids = Vec::with_capacity(suite.cases.len());

    for entry in suite.cases {
        let mut case = CaseDefinition::new(entry.title, entry.method, entry.url);
        case.headers = entry.headers;
        case.body = entry.body;
        case.variables = entry.variables;
        case.enabled = entry.enabled;
        let case_id = case.id;

        for assertion in entry.assertions {
            store.insert_assertion(assertion.into_spec(case_id)).await;
        }
        store.insert_case(case).await;
        case_ids.push(case_id);
    }

    (suite.variables, case_ids)
}
