//! Outgoing requests and the authenticator that decorates them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::session::Session;

/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";
/// Header naming the body encoding.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Header naming the accepted response encoding.
pub const ACCEPT: &str = "Accept";

/// HTTP methods the gateway serves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// The method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug)]
pub struct MethodParseError {
    /// The string that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for MethodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported method: {}", self.invalid_value)
    }
}

impl std::error::Error for MethodParseError {}

impl FromStr for Method {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(MethodParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request on its way to the gateway.  Built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// The HTTP method.
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Header map; always includes the JSON content type.
    pub headers: BTreeMap<String, String>,
    /// Upper bound on the wait for this request, overriding the transport default.
    pub timeout: Option<Duration>,
}

impl OutgoingRequest {
    /// Create a request with the default JSON headers.
    pub fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        headers.insert(ACCEPT.to_string(), "application/json".to_string());
        Self {
            method,
            path: path.into(),
            body,
            headers,
            timeout: None,
        }
    }

    /// Bound the wait for this request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Attach the session's credentials to `request`.
///
/// When the session holds a token the request gains
/// `Authorization: Bearer <token>`; otherwise it is returned unchanged.
pub fn authenticate(request: OutgoingRequest, session: &Session) -> OutgoingRequest {
    match session.token() {
        Some(token) => request.with_header(AUTHORIZATION, format!("Bearer {token}")),
        None => request,
    }
}
