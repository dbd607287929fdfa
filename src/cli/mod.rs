/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;
mod console;

pub use args::{Cli, Commands};
pub use commands::{clear_sessions, list_sessions, send_message, show_session};
pub use console::{format_part, ConsoleView};
