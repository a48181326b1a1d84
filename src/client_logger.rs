//! Logging trait for requests issued through the client.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log every interaction passing through the [`HttpClient`](crate::HttpClient).

use serde_json::Value;

use crate::error::Result;
use crate::request::OutgoingRequest;

/// A trait for logging client operations.
///
/// Implement this trait to record every request the client sends, after the
/// session's credentials have been attached, together with its normalized
/// outcome.
///
/// # Example
///
/// ```rust,ignore
/// use flyora::{ClientLogger, OutgoingRequest, Result};
/// use serde_json::Value;
///
/// struct StderrLogger;
///
/// impl ClientLogger for StderrLogger {
///     fn log_request(&self, request: &OutgoingRequest) {
///         eprintln!("-> {} {}", request.method, request.path);
///     }
///
///     fn log_outcome(&self, request: &OutgoingRequest, outcome: &Result<Value>) {
///         match outcome {
///             Ok(_) => eprintln!("<- {} {} ok", request.method, request.path),
///             Err(err) => eprintln!("<- {} {} {err}", request.method, request.path),
///         }
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is handed to the transport.
    ///
    /// The request may carry an `Authorization` header; implementations
    /// should not write it anywhere durable.
    fn log_request(&self, request: &OutgoingRequest);

    /// Log the normalized outcome of `request`.
    ///
    /// Called exactly once per request, after any session invalidation has
    /// already happened.
    fn log_outcome(&self, request: &OutgoingRequest, outcome: &Result<Value>);
}
