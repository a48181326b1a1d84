// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod error;
pub mod navigator;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;

mod observability;

// Re-exports
pub use auth::{login, logout};
pub use client::HttpClient;
pub use client_logger::ClientLogger;
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result};
pub use navigator::{LogNavigator, Navigator, RecordingNavigator};
pub use observability::register_biometrics;
pub use request::{Method, OutgoingRequest, authenticate};
pub use response::{ResponseUnwrapper, TransportOutcome};
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
pub use transport::{ReqwestTransport, Transport};
