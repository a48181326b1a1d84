//! Chatbot conversation state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chat::extract::extract;
use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::observability::CHAT_QUESTIONS;
use crate::request::Method;

/// Path of the chatbot endpoint, relative to the gateway base URL.
pub const CHATBOT_PATH: &str = "chatbot";

/// Shown when the chatbot could not be reached at all.
pub const ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

/// Who said a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    /// A turn spoken by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A turn spoken by the chatbot.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation with the shop's chatbot.
///
/// The history is append-only and lives only as long as the session.  The
/// chatbot endpoint receives only the latest question.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: HttpClient,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    /// Start an empty conversation over `client`.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    /// Ask the chatbot a question and return its answer as display text.
    ///
    /// Blank questions are rejected without contacting the chatbot.  On
    /// success both the question and the answer are appended to the history;
    /// on failure only the question is.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::client("question must not be empty", None, None));
        }
        CHAT_QUESTIONS.click();
        self.history.push(ChatTurn::user(question));

        let timeout = self.client.config().chat_timeout;
        let response = self
            .client
            .send_with_timeout(
                Method::Post,
                CHATBOT_PATH,
                Some(json!({ "question": question })),
                timeout,
            )
            .await?;

        let answer = extract(&response);
        self.history.push(ChatTurn::assistant(answer.clone()));
        Ok(answer)
    }

    /// Like [`ask`](Self::ask), but answers failures with [`ERROR_MESSAGE`].
    ///
    /// The error message is not recorded in the history.
    pub async fn ask_or_apologize(&mut self, question: &str) -> String {
        match self.ask(question).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "chatbot request failed");
                ERROR_MESSAGE.to_string()
            }
        }
    }

    /// The conversation so far, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// The client this session talks through.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}
