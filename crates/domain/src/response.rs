//! Response snapshot types.
//!
//! A [`ResponseSnapshot`] is the captured, immutable view of one HTTP
//! response: status, headers, cookies, decoded body, and elapsed time. It is
//! built once per case execution and then consumed by every assertion
//! belonging to the case.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body, tagged with how it was decoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    /// The body parsed as JSON.
    Json(Value),
    /// The body kept as raw text (JSON decode failed or was not attempted).
    Text(String),
}

impl ResponseBody {
    /// Returns the parsed JSON value, if the body is structured.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text, if the body is unstructured.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Returns true when the body was decoded as JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// The captured view of one HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response cookies (name to value).
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    /// Decoded body.
    #[serde(default)]
    pub body: ResponseBody,
    /// Time from dispatch to the fully-read body.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ResponseSnapshot {
    /// Creates a new snapshot.
    #[must_use]
    pub const fn new(
        status: u16,
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
        body: ResponseBody,
        duration: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            cookies,
            body,
            duration,
        }
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Gets a cookie value by name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn snapshot() -> ResponseSnapshot {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let mut cookies = HashMap::new();
        cookies.insert("session".to_string(), "abc123".to_string());

        ResponseSnapshot::new(
            200,
            headers,
            cookies,
            ResponseBody::Json(json!({"ok": true})),
            Duration::from_millis(42),
        )
    }

    #[test]
    fn test_header_case_insensitive() {
        let snap = snapshot();
        assert_eq!(
            snap.header("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(snap.header("CONTENT-TYPE"), snap.header("Content-Type"));
        assert_eq!(snap.header("X-Missing"), None);
    }

    #[test]
    fn test_cookie_lookup() {
        let snap = snapshot();
        assert_eq!(snap.cookie("session"), Some(&"abc123".to_string()));
        assert_eq!(snap.cookie("missing"), None);
    }

    #[test]
    fn test_body_kind() {
        let json_body = ResponseBody::Json(json!([1, 2]));
        assert!(json_body.is_json());
        assert_eq!(json_body.as_json(), Some(&json!([1, 2])));
        assert_eq!(json_body.as_text(), None);

        let text_body = ResponseBody::Text("hello".to_string());
        assert!(!text_body.is_json());
        assert_eq!(text_body.as_text(), Some("hello"));
    }

    #[test]
    fn test_is_success() {
        assert!(snapshot().is_success());
        let snap = ResponseSnapshot::new(
            404,
            HashMap::new(),
            HashMap::new(),
            ResponseBody::default(),
            Duration::ZERO,
        );
        assert!(!snap.is_success());
    }

    #[test]
    fn test_duration_serde_roundtrip() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: ResponseSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(42));
    }
}
