//! Test case definitions.
//!
//! A [`CaseDefinition`] is the immutable per-run snapshot of one API test
//! case: the request template, the case-scoped variable bindings, and an
//! enabled flag. The engine receives a read-only copy per execution and
//! never mutates it; ownership stays with the persistence collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::method::HttpMethod;

/// Variable bindings used to resolve `${name}` placeholders.
///
/// Values are arbitrary JSON; non-string values are substituted using their
/// JSON string form.
pub type Bindings = HashMap<String, Value>;

/// One stored API test case: an HTTP request template plus its variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDefinition {
    /// Unique identifier.
    #[serde(default = "generate_id")]
    pub id: Uuid,
    /// Human-readable case title.
    pub title: String,
    /// HTTP method to dispatch.
    #[serde(default)]
    pub method: HttpMethod,
    /// URL template; may contain `${name}` placeholders.
    pub url: String,
    /// Header templates; values may contain `${name}` placeholders.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Optional body template; any nested string may contain placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Case-scoped variable bindings. On key collision these override
    /// run-level bindings.
    #[serde(default)]
    pub variables: Bindings,
    /// Disabled cases are skipped before dispatch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn generate_id() -> Uuid {
    Uuid::now_v7()
}

const fn default_enabled() -> bool {
    true
}

impl CaseDefinition {
    /// Creates a new enabled case with no headers, body, or variables.
    #[must_use]
    pub fn new(title: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            variables: Bindings::new(),
            enabled: true,
        }
    }

    /// Adds a header template (builder pattern).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body template (builder pattern).
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a case-scoped variable binding (builder pattern).
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Marks the case as disabled (builder pattern).
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
