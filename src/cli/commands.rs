use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::console::{format_part, ConsoleView};
use crate::chat::ConversationController;
use crate::constants::CLEAR_ALL_PROMPT;
use crate::generation::GenerationClient;
use crate::session::{list_sessions_descending, SessionId, SessionStore};

/// List stored sessions, newest first; `*` marks the one a new run would open
pub fn list_sessions(store: &SessionStore) {
    let collection = store.load();
    if collection.is_empty() {
        println!("No stored conversations.");
        return;
    }

    let newest = collection.newest_id();
    for summary in list_sessions_descending(&collection) {
        let marker = if Some(&summary.id) == newest { "*" } else { " " };
        println!(
            "{} {}  {}",
            marker.green(),
            summary.id.to_string().dimmed(),
            summary.title
        );
    }
}

/// Print every turn of a stored session
pub fn show_session(store: &SessionStore, id: &str) {
    let collection = store.load();
    let Some(session) = collection.get(&SessionId::from(id)) else {
        println!("No conversation with id {}", id);
        return;
    };

    println!("{}", session.title.bold());
    println!();
    for turn in &session.history {
        for part in &turn.parts {
            println!("{}", format_part(turn.role, part));
        }
    }
}

/// Send one message and print the reply.
///
/// Returns `false` when the reply is an error turn. Nothing is written when
/// the message is blank or the session does not exist.
pub async fn send_message(
    store: SessionStore,
    client: Arc<dyn GenerationClient>,
    message: &str,
    session: Option<&str>,
    new: bool,
) -> Result<bool> {
    if message.trim().is_empty() {
        anyhow::bail!("Nothing to send: message is empty");
    }

    let stored = store.load();
    let target = session.map(SessionId::from);
    if let Some(id) = &target {
        if !stored.contains(id) {
            anyhow::bail!("No conversation with id {}", id);
        }
    }

    // Opening an empty store already starts a fresh session
    let mut controller = ConversationController::open(store, Arc::clone(&client), ConsoleView::new());
    if new && !stored.is_empty() {
        controller.new_session();
    } else if let Some(id) = &target {
        controller.select_session(id);
    }

    controller.view_mut().set_live(true);
    let Some(pending) = controller.begin_submit(message) else {
        anyhow::bail!("Nothing to send: message is empty");
    };

    let result = client.generate(&pending.history).await;
    let ok = result.is_ok();
    controller.complete_submit(pending, result);

    if let Some(id) = controller.active_id() {
        eprintln!("{}", format!("session {}", id).dimmed());
    }

    Ok(ok)
}

/// Delete every stored session, asking first unless `yes`
pub fn clear_sessions(
    store: SessionStore,
    client: Arc<dyn GenerationClient>,
    yes: bool,
) -> Result<bool> {
    let cleared = clear_confirmed(store, client, |prompt| yes || ask(prompt));
    if cleared {
        println!("All conversations deleted.");
    } else {
        println!("Nothing deleted.");
    }

    Ok(cleared)
}

// Storage is left untouched unless `confirm` agrees
fn clear_confirmed<F>(store: SessionStore, client: Arc<dyn GenerationClient>, confirm: F) -> bool
where
    F: FnOnce(&str) -> bool,
{
    if !confirm(CLEAR_ALL_PROMPT) {
        return false;
    }
    let mut controller = ConversationController::open(store, client, ConsoleView::new());
    controller.clear_all(|_| true)
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
