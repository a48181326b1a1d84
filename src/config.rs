//! Client configuration.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::navigator::DEFAULT_LOGIN_PATH;

/// The gateway used when nothing else is configured.
pub const DEFAULT_API_URL: &str =
    "https://4zhj8ihfhh.execute-api.ap-southeast-1.amazonaws.com/dev/";
/// Default transport deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Upper bound on the wait for a chatbot answer.
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable overriding the gateway base URL.
pub const API_URL_ENV: &str = "FLYORA_API_BASE_URL";
/// Environment variable overriding the transport deadline, in seconds.
pub const TIMEOUT_ENV: &str = "FLYORA_TIMEOUT_SECS";

/// Settings for an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.  Always ends in `/`.
    pub base_url: Url,

    /// Transport deadline for ordinary requests.
    pub timeout: Duration,

    /// Deadline for chatbot requests.
    pub chat_timeout: Duration,

    /// Where authentication failures send the user.
    pub login_path: String,
}

impl ClientConfig {
    /// Creates a config with default values.
    ///
    /// Defaults:
    /// - Base URL: the production gateway
    /// - Timeout: 60 seconds
    /// - Chat timeout: 20 seconds
    /// - Login path: `/login`
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: DEFAULT_TIMEOUT,
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Creates a config from the environment, falling back to defaults.
    ///
    /// A malformed variable is reported as a [`ClientError`](crate::ErrorKind::ClientError)
    /// with no status code and a message naming the variable.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        if let Ok(url) = env::var(API_URL_ENV) {
            config = config.with_base_url(&url)?;
        }
        if let Ok(secs) = env::var(TIMEOUT_ENV) {
            config = config.with_timeout(parse_timeout_secs(&secs)?);
        }
        Ok(config)
    }

    /// Sets the base URL.  A trailing slash is added when missing so that
    /// relative paths join beneath it.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = Url::parse(&base_url)?;
        Ok(self)
    }

    /// Sets the transport deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the chatbot deadline.
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Sets the login path.
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Resolve `path` against the base URL.  Leading slashes are ignored so
    /// that `/api/v1/cart` stays beneath the base URL's own path.
    ///
    /// Paths that resolve outside the base URL (another origin, or `..`
    /// segments climbing above the base path) are a client error.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(Error::client(
                format!("path {path:?} resolves outside {}", self.base_url),
                None,
                None,
            ));
        }
        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_timeout_secs(secs: &str) -> Result<Duration> {
    let parsed = secs.trim().parse::<u64>().map_err(|_| {
        Error::client(
            format!("invalid configuration: {TIMEOUT_ENV} must be whole seconds, got {secs:?}"),
            None,
            None,
        )
    })?;
    Ok(Duration::from_secs(parsed))
}

// DEFAULT_API_URL is a constant; `default_api_url_parses` pins it.
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL should be valid")
}
