use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::chat::PendingRequest;
use crate::constants::UI_SCROLL_LINES;
use crate::generation::{GenerationError, ResponsePayload};
use crate::tui::render::render_ui;
use crate::tui::{App, AppState};

/// A finished request coming back from its task
struct Reply {
    pending: PendingRequest,
    result: Result<ResponsePayload, GenerationError>,
}

/// Run the terminal UI
pub async fn run_ui(mut app: App) -> Result<()> {
    if !crossterm::tty::IsTty::is_tty(&io::stdout()) {
        eprintln!("Parley needs an interactive terminal for chat.");
        eprintln!("   Use `parley send <message>` from scripts and pipes.");
        return Err(anyhow::anyhow!("No interactive terminal available"));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (tx, mut rx) = mpsc::channel::<Reply>(16);

    let res = run_app(&mut terminal, &mut app, tx, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("TUI loop failed: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: mpsc::Sender<Reply>,
    rx: &mut mpsc::Receiver<Reply>,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(app.tick)? {
            if let Event::Key(key) = event::read()? {
                if let Some(pending) = handle_key(app, key) {
                    spawn_request(app, pending, tx.clone());
                }
            }
        }

        while let Ok(reply) = rx.try_recv() {
            debug!("Reply arrived for session {}", reply.pending.session_id);
            app.controller.complete_submit(reply.pending, reply.result);
            app.scroll_to_bottom();
        }
    }

    Ok(())
}

/// Run the request on its own task so the UI keeps drawing
fn spawn_request(app: &App, pending: PendingRequest, tx: mpsc::Sender<Reply>) {
    let client = app.controller.client();
    tokio::spawn(async move {
        let result = client.generate(&pending.history).await;
        if tx.send(Reply { pending, result }).await.is_err() {
            debug!("UI closed before the reply arrived");
        }
    });
}

/// Apply one key press; returns a request to run when a message was submitted
pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Option<PendingRequest> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return None;
    }

    match app.state {
        AppState::ConfirmClear => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    app.controller.clear_all(|_| true);
                    app.scroll_to_bottom();
                    app.set_status("All conversations deleted");
                    app.state = AppState::Insert;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.clear_status();
                    app.state = AppState::Insert;
                }
                _ => {}
            }
            None
        }
        AppState::Insert => handle_insert_key(app, key),
    }
}

fn handle_insert_key(app: &mut App, key: KeyEvent) -> Option<PendingRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Enter if alt => app.input_mut().push('\n'),
        KeyCode::Enter => {
            if app.controller.is_waiting() {
                app.set_status("Still waiting for the previous reply");
                return None;
            }
            let input = app.view().input.clone();
            let pending = app.controller.begin_submit(&input);
            if pending.is_some() {
                app.clear_status();
                app.scroll_to_bottom();
            }
            return pending;
        }
        KeyCode::Char('n') if ctrl => {
            app.controller.new_session();
            app.scroll_to_bottom();
        }
        KeyCode::Char('d') if ctrl => app.state = AppState::ConfirmClear,
        KeyCode::Char('t') if ctrl => {
            app.controller.toggle_dark_mode();
        }
        KeyCode::Up if ctrl => select_relative(app, -1),
        KeyCode::Down if ctrl => select_relative(app, 1),
        KeyCode::PageUp => select_relative(app, -1),
        KeyCode::PageDown => select_relative(app, 1),
        KeyCode::Up => app.scroll_up(UI_SCROLL_LINES),
        KeyCode::Down => app.scroll_down(UI_SCROLL_LINES),
        KeyCode::Tab => app.toggle_sidebar(),
        KeyCode::Char(c) if !ctrl => app.input_mut().push(c),
        KeyCode::Backspace => {
            app.input_mut().pop();
        }
        _ => {}
    }

    None
}

fn select_relative(app: &mut App, offset: isize) {
    if app.controller.select_relative(offset) {
        app.scroll_to_bottom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ConversationController;
    use crate::generation::{GenerationClient, MockGenerationClient};
    use crate::session::{Role, SessionStore};
    use crate::storage::MemoryStorage;
    use crate::tui::TuiView;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> (App, SessionStore) {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let mut mock = MockGenerationClient::new();
        mock.expect_generate().times(0);
        let client: Arc<dyn GenerationClient> = Arc::new(mock);
        let controller = ConversationController::open(store.clone(), client, TuiView::default());
        (
            App::new(controller, "http://localhost", true, Duration::from_millis(10)),
            store,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_enter_submits_typed_text() {
        let (mut app, store) = app();
        type_text(&mut app, "hello");
        assert_eq!(app.view().input, "hello");

        let pending = handle_key(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(pending.history.len(), 1);
        assert!(app.view().input.is_empty());
        assert!(app.view().typing);
        assert_eq!(app.title(), "hello");

        // Second submit is refused while waiting
        type_text(&mut app, "again");
        assert!(handle_key(&mut app, press(KeyCode::Enter)).is_none());
        assert_eq!(app.view().input, "again");

        app.controller
            .complete_submit(pending, Ok(ResponsePayload::Text("hi".to_string())));
        let messages = &app.view().messages;
        assert_eq!(messages.last().unwrap().role, Role::Model);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_blank_input_is_not_submitted() {
        let (mut app, _) = app();
        type_text(&mut app, "   ");
        assert!(handle_key(&mut app, press(KeyCode::Enter)).is_none());
        assert!(!app.controller.is_waiting());
    }

    #[test]
    fn test_alt_enter_inserts_newline() {
        let (mut app, _) = app();
        type_text(&mut app, "a");
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        type_text(&mut app, "b");
        assert_eq!(app.view().input, "a\nb");
    }

    #[test]
    fn test_clear_confirmation_flow() {
        let (mut app, store) = app();
        handle_key(&mut app, ctrl('n'));
        assert_eq!(app.controller.collection().len(), 2);

        handle_key(&mut app, ctrl('d'));
        assert_eq!(app.state, AppState::ConfirmClear);
        handle_key(&mut app, press(KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Insert);
        assert_eq!(app.controller.collection().len(), 2);

        handle_key(&mut app, ctrl('d'));
        handle_key(&mut app, press(KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Insert);
        assert_eq!(app.controller.collection().len(), 1);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_dark_mode_and_quit() {
        let (mut app, store) = app();
        let before = app.view().dark_mode;
        handle_key(&mut app, ctrl('t'));
        assert_eq!(app.view().dark_mode, !before);
        assert_eq!(store.load_dark_mode(), !before);

        handle_key(&mut app, ctrl('c'));
        assert!(!app.running);
    }
}
