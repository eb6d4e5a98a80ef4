//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port using the reqwest
//! library. It handles all HTTP communication for the engine, including
//! response body decoding and cookie capture.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, Url};
use verity_application::ports::{HttpTransport, RequestPlan, TransportError};
use verity_domain::{HttpMethod, ResponseBody, ResponseSnapshot};

/// HTTP transport implementation using reqwest.
///
/// This is the primary HTTP adapter for Verity. It wraps `reqwest::Client`
/// and implements the `HttpTransport` port from the application layer.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "Verity/0.1.0"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent("Verity/0.1.0")
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport around a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to port `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            let host = error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string();
            if message.to_lowercase().contains("dns") || message.to_lowercase().contains("resolve")
            {
                return TransportError::Dns { host, message };
            }
            if message.to_lowercase().contains("refused") {
                return TransportError::ConnectionRefused { host };
            }
            return TransportError::ConnectionFailed(message);
        }

        TransportError::Other(error.to_string())
    }
}

/// Parses `Set-Cookie` headers into a name-to-value map; cookie attributes
/// after the first `;` are discarded.
fn collect_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let raw = value.to_str().ok()?;
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Decodes a response body: JSON when it parses, raw text otherwise.
fn decode_body(bytes: &[u8]) -> ResponseBody {
    serde_json::from_slice(bytes).map_or_else(
        |_| ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        ResponseBody::Json,
    )
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, plan: &RequestPlan) -> Result<ResponseSnapshot, TransportError> {
        let url = Url::parse(&plan.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", plan.url)))?;

        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = plan.timeout.as_millis() as u64;

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(plan.method), url)
            .timeout(plan.timeout);

        for (name, value) in &plan.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &plan.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let cookies = collect_cookies(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;

        // Timing covers dispatch through the fully-read body.
        let duration = start.elapsed();

        Ok(ResponseSnapshot::new(
            status,
            headers,
            cookies,
            decode_body(&bytes),
            duration,
        ))
    }
}
