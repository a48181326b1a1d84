//! Normalization of transport outcomes into payloads or errors.

use std::error;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::navigator::Navigator;
use crate::observability::{CLIENT_AUTH_FAILURES, CLIENT_LOGIN_REDIRECTS};
use crate::session::SessionStore;

/// What came back from the transport for one request.
#[derive(Debug)]
pub enum TransportOutcome {
    /// The gateway answered.
    Response {
        /// HTTP status code.
        status: u16,
        /// Decoded body.  Non-JSON bodies arrive as strings, empty ones as null.
        body: Value,
    },

    /// No answer reached the client.
    Failure {
        /// Human-readable description.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn error::Error + Send + Sync>>,
    },
}

impl TransportOutcome {
    /// An answered request.
    pub fn response(status: u16, body: Value) -> Self {
        TransportOutcome::Response { status, body }
    }

    /// A request that never got an answer.
    pub fn failure(message: impl Into<String>) -> Self {
        TransportOutcome::Failure {
            message: message.into(),
            source: None,
        }
    }
}

impl From<reqwest::Error> for TransportOutcome {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {err}")
        } else if err.is_connect() {
            format!("Connection error: {err}")
        } else {
            format!("Request failed: {err}")
        };
        TransportOutcome::Failure {
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// Turns transport outcomes into domain payloads or normalized errors.
///
/// Authentication failures clear the shared session and, once per expiry
/// episode, send the user to the login entry point.
#[derive(Clone)]
pub struct ResponseUnwrapper {
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl ResponseUnwrapper {
    /// Create an unwrapper that invalidates `session` and redirects via `navigator`.
    pub fn new(
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            session,
            navigator,
            login_path: login_path.into(),
        }
    }

    /// Normalize one outcome.  Call exactly once per request.
    pub fn process(&self, outcome: TransportOutcome) -> Result<Value> {
        let result = Self::normalize(outcome);
        if let Err(err) = &result
            && err.is_auth_failure()
            && self.session.expire()
        {
            CLIENT_LOGIN_REDIRECTS.click();
            self.navigator.go_to_login(&self.login_path);
        }
        result
    }

    /// Normalize one outcome without touching the session or the navigator.
    ///
    /// Used for requests whose 401/403 answers reject credentials rather than
    /// signal an expired session.
    pub fn normalize(outcome: TransportOutcome) -> Result<Value> {
        match outcome {
            TransportOutcome::Response { status, body } if (200..300).contains(&status) => {
                Ok(body)
            }
            TransportOutcome::Response { status, body } => {
                let payload = Some(body).filter(|b| !b.is_null());
                let err = Error::from_status(status, payload);
                if err.is_auth_failure() {
                    CLIENT_AUTH_FAILURES.click();
                }
                Err(err)
            }
            TransportOutcome::Failure { message, source } => Err(Error::network(message, source)),
        }
    }
}
