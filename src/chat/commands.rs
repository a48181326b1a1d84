//! Slash command parsing for the chat REPL.
//!
//! Input starting with `/` controls the session locally and is never sent to
//! the chatbot.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Log in with a username and password.
    Login {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },

    /// Drop the current session.
    Logout,

    /// Show who the session belongs to.
    Whoami,

    /// Print the conversation so far.
    History,

    /// Clear the conversation history.
    Clear,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent to the chatbot.
///
/// # Examples
///
/// ```
/// # use flyora::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/login linh hunter2").is_some());
/// assert!(parse_command("Do you sell bird food?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" => parse_login(argument),
        "logout" => ChatCommand::Logout,
        "whoami" => ChatCommand::Whoami,
        "history" => ChatCommand::History,
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("unknown command: /{command}")),
    };
    Some(result)
}

fn parse_login(argument: Option<&str>) -> ChatCommand {
    let Some(argument) = argument else {
        return ChatCommand::Invalid("/login requires a username and password".to_string());
    };
    match argument.split_once(char::is_whitespace) {
        Some((username, password)) if !password.trim().is_empty() => ChatCommand::Login {
            username: username.to_string(),
            password: password.trim().to_string(),
        },
        _ => ChatCommand::Invalid("/login requires a username and password".to_string()),
    }
}

/// Returns the help text for the chat REPL.
pub fn help_text() -> &'static str {
    "\
/login <user> <password>  Log in to the shop
/logout                   Log out
/whoami                   Show the logged-in user
/history                  Show the conversation so far
/clear                    Clear the conversation
/help                     Show this help
/quit                     Exit"
}
