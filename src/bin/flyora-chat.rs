//! Interactive chat with the Flyora shop chatbot.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the production gateway
//! flyora-chat
//!
//! # Talk to a local gateway and keep the session elsewhere
//! flyora-chat --base-url http://localhost:8080 --session-file /tmp/flyora.json
//! ```
//!
//! # Commands
//!
//! - `/login <user> <password>` - Log in
//! - `/logout` - Log out
//! - `/whoami` - Show the logged-in user
//! - `/history` - Show the conversation
//! - `/clear` - Clear the conversation
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use flyora::chat::{ChatArgs, ChatCommand, ChatSession, help_text, parse_command};
use flyora::{FileStorage, HttpClient, SessionStore, login, logout};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("flyora-chat [OPTIONS]");
    let config = args.client_config()?;
    let session = SessionStore::create(FileStorage::new(args.session_file()));
    let navigator = Arc::new(|login_path: &str| {
        println!("Your session has expired ({login_path}). Use /login to sign in again.");
    });
    let client = HttpClient::new(config, session, navigator)?;
    let mut chat = ChatSession::new(client.clone());
    let mut rl = DefaultEditor::new()?;

    println!("Flyora chat ({})", client.config().base_url);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Login { username, password } => {
                            match login(&client, &username, &password).await {
                                Ok(_) => println!("Logged in as {username}."),
                                Err(err) => eprintln!("Login failed: {err}"),
                            }
                        }
                        ChatCommand::Logout => {
                            logout(&client);
                            println!("Logged out.");
                        }
                        ChatCommand::Whoami => match client.session().get().user() {
                            Some(user) => println!("{user}"),
                            None if client.session().get().is_authenticated() => {
                                println!("Logged in (no user record).")
                            }
                            None => println!("Not logged in."),
                        },
                        ChatCommand::History => {
                            for turn in chat.history() {
                                println!("    {}: {}", turn.role, turn.content);
                            }
                        }
                        ChatCommand::Clear => {
                            chat.clear();
                            println!("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            eprintln!("Error: {message}");
                        }
                    }
                    continue;
                }

                tokio::select! {
                    answer = chat.ask_or_apologize(line) => println!("Bot: {answer}\n"),
                    _ = tokio::signal::ctrl_c() => println!("\n(cancelled)\n"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        }
    }
    Ok(())
}
