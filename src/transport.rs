//! The primitive that puts a request on the wire.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::request::OutgoingRequest;
use crate::response::TransportOutcome;

/// Sends one fully-decorated request and reports what came back.
///
/// Implementations never interpret the status code; that is the job of the
/// [`ResponseUnwrapper`](crate::ResponseUnwrapper).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to `url`.
    async fn execute(&self, url: &Url, request: &OutgoingRequest) -> TransportOutcome;
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout` unless the
    /// request carries its own bound.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::network(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self { client, timeout })
    }

    /// The default deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, url: &Url, request: &OutgoingRequest) -> TransportOutcome {
        let mut builder = self.client.request(request.method.into(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return TransportOutcome::from(e),
        };
        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => TransportOutcome::response(status, decode_body(&text)),
            Err(e) => TransportOutcome::from(e),
        }
    }
}

/// Decode a response body.  JSON bodies are parsed, anything else is kept as
/// a string, and an empty body is null.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
