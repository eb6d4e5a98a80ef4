//! HTTP transport port

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use verity_domain::{HttpMethod, ResponseSnapshot};

/// A fully-resolved request, ready to dispatch.
///
/// All `${name}` placeholders have already been substituted; the transport
/// performs no further interpretation of the URL, headers, or body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// JSON body; `None` for methods that do not carry one.
    pub body: Option<Value>,
    /// Per-call timeout; exceeding it is a [`TransportError::Timeout`].
    pub timeout: Duration,
}

/// Network-level failures while dispatching a request.
///
/// Any of these is fatal to the single case and maps to an `error`
/// outcome; none of them aborts the enclosing batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request exceeded its per-call timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The host refused the connection.
    #[error("connection refused by {host}")]
    ConnectionRefused {
        /// The target host.
        host: String,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    Dns {
        /// The target host.
        host: String,
        /// The resolver error message.
        message: String,
    },

    /// The connection could not be established for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    BodyRead(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for dispatching HTTP requests.
///
/// The engine requires only "send method+url+headers+body, receive
/// status+headers+cookies+body"; any conforming client works.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Dispatches exactly one request and captures the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network-level failure (connection
    /// refused, timeout, DNS failure, malformed response).
    async fn send(&self, plan: &RequestPlan) -> Result<ResponseSnapshot, TransportError>;
}
