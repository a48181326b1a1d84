//! Chatbot support.
//!
//! - [`extract`]: turns whatever the chatbot answers with into display text
//! - [`session`]: conversation history and the chatbot request contract
//! - [`commands`]: slash commands understood by the `flyora-chat` REPL
//! - [`config`]: command-line arguments for the REPL

mod commands;
mod config;
mod extract;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, DEFAULT_SESSION_FILE};
pub use extract::{ANSWER_KEYS, FALLBACK_MESSAGE, ResponseEnvelope, Wrapped, extract};
pub use session::{CHATBOT_PATH, ChatRole, ChatSession, ChatTurn, ERROR_MESSAGE};
