//! Response value extraction
//!
//! Projects a single value out of an already-captured [`ResponseSnapshot`]
//! according to an extraction directive. This is a deterministic pure
//! projection; absence is always an error, never a null value, so callers
//! can distinguish "field missing" from "field present and null".

use serde_json::Value;
use thiserror::Error;
use verity_domain::{ExtractionKind, ResponseSnapshot};

/// Errors produced while locating a value in a response snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Header or cookie extraction was requested without a key.
    #[error("{kind} extraction requires a key")]
    MissingKey {
        /// The extraction kind missing its key.
        kind: ExtractionKind,
    },

    /// The named header is absent from the response.
    #[error("header '{name}' not found in response")]
    HeaderNotFound {
        /// The requested header name.
        name: String,
    },

    /// The named cookie is absent from the response.
    #[error("cookie '{name}' not found in response")]
    CookieNotFound {
        /// The requested cookie name.
        name: String,
    },

    /// JSON extraction was requested without a path.
    #[error("json extraction requires a path")]
    MissingPath,

    /// JSON extraction was requested but the body is not structured.
    #[error("response body is not JSON")]
    BodyNotJson,

    /// Text extraction was requested but the body is not raw text.
    #[error("response body is not text")]
    BodyNotText,

    /// A path segment does not exist on the current node.
    #[error("json path segment '{segment}' not found")]
    SegmentNotFound {
        /// The missing segment.
        segment: String,
    },

    /// Traversal reached a non-object node with segments remaining.
    #[error("cannot look up '{segment}' in a non-object value")]
    NotAnObject {
        /// The segment that could not be applied.
        segment: String,
    },
}

/// Extracts the targeted value from a response snapshot.
///
/// - `status_code` always succeeds and returns the integer status.
/// - `header` / `cookie` require a non-empty `key`; an absent key in the
///   response is an error.
/// - `json` requires a non-empty dotted `path` (a leading `$.` is trimmed);
///   every segment must exist and intermediate nodes must be objects.
/// - `text` requires the body to be raw text.
///
/// # Errors
///
/// Returns an [`ExtractError`] describing exactly what could not be
/// located.
pub fn extract(
    snapshot: &ResponseSnapshot,
    kind: ExtractionKind,
    key: Option<&str>,
    path: Option<&str>,
) -> Result<Value, ExtractError> {
    match kind {
        ExtractionKind::StatusCode => Ok(Value::from(snapshot.status)),

        ExtractionKind::Header => {
            let name = require_key(kind, key)?;
            snapshot
                .header(name)
                .map(|value| Value::String(value.clone()))
                .ok_or_else(|| ExtractError::HeaderNotFound {
                    name: name.to_string(),
                })
        }

        ExtractionKind::Cookie => {
            let name = require_key(kind, key)?;
            snapshot
                .cookie(name)
                .map(|value| Value::String(value.clone()))
                .ok_or_else(|| ExtractError::CookieNotFound {
                    name: name.to_string(),
                })
        }

        ExtractionKind::Json => {
            let path = path
                .filter(|p| !p.trim().is_empty())
                .ok_or(ExtractError::MissingPath)?;
            let body = snapshot.body.as_json().ok_or(ExtractError::BodyNotJson)?;
            extract_json(body, path)
        }

        ExtractionKind::Text => snapshot
            .body
            .as_text()
            .map(|text| Value::String(text.to_string()))
            .ok_or(ExtractError::BodyNotText),
    }
}

fn require_key(kind: ExtractionKind, key: Option<&str>) -> Result<&str, ExtractError> {
    key.filter(|k| !k.is_empty())
        .ok_or(ExtractError::MissingKey { kind })
}

/// Walks a dotted path through a JSON value, one segment per level.
fn extract_json(body: &Value, path: &str) -> Result<Value, ExtractError> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("$.").unwrap_or(trimmed);

    let mut current = body;
    for segment in trimmed.split('.') {
        match current {
            Value::Object(entries) => {
                current = entries
                    .get(segment)
                    .ok_or_else(|| ExtractError::SegmentNotFound {
                        segment: segment.to_string(),
                    })?;
            }
            _ => {
                return Err(ExtractError::NotAnObject {
                    segment: segment.to_string(),
                });
            }
        }
    }

    Ok(current.clone())
}
