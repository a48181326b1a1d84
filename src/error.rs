//! Error types for the Flyora client core.
//!
//! Every failure a call site can observe is an [`Error`]: a normalized value
//! that abstracts over network, authentication, client, and server failures.

use std::error;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// The category of a normalized error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response reached the client (connect failure, DNS, timeout).
    NetworkFailure,

    /// The gateway answered 401 or 403; the session is invalid or forbidden.
    AuthFailure,

    /// The gateway rejected the request (any other 4xx).
    ClientError,

    /// The gateway failed to serve the request (5xx).
    ServerError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NetworkFailure => write!(f, "network_failure"),
            ErrorKind::AuthFailure => write!(f, "auth_failure"),
            ErrorKind::ClientError => write!(f, "client_error"),
            ErrorKind::ServerError => write!(f, "server_error"),
        }
    }
}

/// The normalized error returned by every request issued through the client.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    status_code: Option<u16>,
    payload: Option<Value>,
    message: String,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new network failure.  Network failures never carry a status or payload.
    pub fn network(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error {
            kind: ErrorKind::NetworkFailure,
            status_code: None,
            payload: None,
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new authentication failure.
    pub fn auth(status_code: u16, payload: Option<Value>) -> Self {
        Error {
            kind: ErrorKind::AuthFailure,
            status_code: Some(status_code),
            payload,
            message: "session expired or access forbidden".to_string(),
            source: None,
        }
    }

    /// Creates a new client error.
    pub fn client(
        message: impl Into<String>,
        status_code: Option<u16>,
        payload: Option<Value>,
    ) -> Self {
        Error {
            kind: ErrorKind::ClientError,
            status_code,
            payload,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new server error.
    pub fn server(message: impl Into<String>, status_code: u16, payload: Option<Value>) -> Self {
        Error {
            kind: ErrorKind::ServerError,
            status_code: Some(status_code),
            payload,
            message: message.into(),
            source: None,
        }
    }

    /// Maps a non-success HTTP status to the matching error kind.
    ///
    /// 401 and 403 become [`ErrorKind::AuthFailure`], 5xx becomes
    /// [`ErrorKind::ServerError`], everything else is a client error.
    pub fn from_status(status_code: u16, payload: Option<Value>) -> Self {
        match status_code {
            401 | 403 => Error::auth(status_code, payload),
            500..=599 => Error::server("gateway failed to serve request", status_code, payload),
            _ => Error::client("request rejected by gateway", Some(status_code), payload),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The HTTP status code, absent for network failures.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// The response body the gateway sent along with the failure, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// A human-readable description for diagnostics.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if no response reached the client.
    pub fn is_network_failure(&self) -> bool {
        self.kind == ErrorKind::NetworkFailure
    }

    /// Returns true if the session was rejected.
    pub fn is_auth_failure(&self) -> bool {
        self.kind == ErrorKind::AuthFailure
    }

    /// Returns true if the request itself was invalid.
    pub fn is_client_error(&self) -> bool {
        self.kind == ErrorKind::ClientError
    }

    /// Returns true if the gateway failed.
    pub fn is_server_error(&self) -> bool {
        self.kind == ErrorKind::ServerError
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.status_code == other.status_code
            && self.payload == other.payload
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Error {
            kind,
            status_code,
            message,
            ..
        } = self;
        match kind {
            ErrorKind::NetworkFailure => write!(f, "Network failure: {message}"),
            ErrorKind::AuthFailure => {
                if let Some(status_code) = status_code {
                    write!(f, "Authentication failure: {message} (status {status_code})")
                } else {
                    write!(f, "Authentication failure: {message}")
                }
            }
            ErrorKind::ClientError => {
                if let Some(status_code) = status_code {
                    write!(f, "Client error: {message} (status {status_code})")
                } else {
                    write!(f, "Client error: {message}")
                }
            }
            ErrorKind::ServerError => {
                if let Some(status_code) = status_code {
                    write!(f, "Server error: {message} (status {status_code})")
                } else {
                    write!(f, "Server error: {message}")
                }
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            kind: ErrorKind::ClientError,
            status_code: None,
            payload: None,
            message: format!("URL parse error: {err}"),
            source: Some(Arc::new(err)),
        }
    }
}

/// A specialized Result type for Flyora operations.
pub type Result<T> = std::result::Result<T, Error>;
