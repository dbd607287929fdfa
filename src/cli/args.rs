use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "A terminal chat client with locally stored conversations", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Generation endpoint URL (overrides config)
    #[arg(long, env = "PARLEY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Directory holding stored chats (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// List stored sessions, newest first
    List,
    /// Print the transcript of a session
    Show {
        /// Session id, e.g. chat_1700000000000
        id: String,
    },
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
        /// Session to continue (defaults to the newest)
        #[arg(long, conflicts_with = "new")]
        session: Option<String>,
        /// Start a new session for this message
        #[arg(long)]
        new: bool,
    },
    /// Delete all stored sessions
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Write a default configuration file
    Init,
}
