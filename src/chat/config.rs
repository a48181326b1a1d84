//! Command-line configuration for the chat REPL.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::config::ClientConfig;
use crate::error::Result;

/// Session file used when none is given.
pub const DEFAULT_SESSION_FILE: &str = ".flyora-session.json";

/// Command-line arguments for the flyora-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Gateway base URL.
    #[arrrg(optional, "Gateway base URL (default: $FLYORA_API_BASE_URL or production)", "URL")]
    pub base_url: Option<String>,

    /// Where the session is persisted between runs.
    #[arrrg(optional, "Session file (default: .flyora-session.json)", "PATH")]
    pub session_file: Option<String>,

    /// Chatbot deadline in seconds.
    #[arrrg(optional, "Seconds to wait for the chatbot (default: 20)", "SECS")]
    pub chat_timeout: Option<u64>,
}

impl ChatArgs {
    /// Resolve the client configuration: the environment first, then these arguments.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url)?;
        }
        if let Some(secs) = self.chat_timeout {
            config = config.with_chat_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// The session file to use.
    pub fn session_file(&self) -> PathBuf {
        PathBuf::from(
            self.session_file
                .as_deref()
                .unwrap_or(DEFAULT_SESSION_FILE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_override_defaults() {
        let args = ChatArgs {
            base_url: Some("http://localhost:8080".to_string()),
            session_file: Some("/tmp/session.json".to_string()),
            chat_timeout: Some(5),
        };
        let config = args.client_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.chat_timeout, Duration::from_secs(5));
        assert_eq!(args.session_file(), PathBuf::from("/tmp/session.json"));
    }

    #[test]
    fn default_session_file() {
        assert_eq!(
            ChatArgs::default().session_file(),
            PathBuf::from(DEFAULT_SESSION_FILE)
        );
    }
}
