use std::time::Duration;

use crate::chat::{ChatView, ConversationController};
use crate::session::{Part, Role, SessionId, SessionSummary};

/// A rendered chat bubble
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub role: Role,
    pub text: String,
    /// Placeholder describing an attached image
    pub image: Option<String>,
}

/// What the controller has pushed to the terminal, plus the input buffer
#[derive(Debug, Default)]
pub struct TuiView {
    pub messages: Vec<DisplayMessage>,
    pub typing: bool,
    pub sessions: Vec<SessionSummary>,
    pub active: Option<SessionId>,
    pub dark_mode: bool,
    pub input: String,
}

impl ChatView for TuiView {
    fn clear_messages(&mut self) {
        self.messages.clear();
        self.typing = false;
    }

    fn render_turn(&mut self, role: Role, part: &Part) {
        self.messages.push(DisplayMessage {
            role,
            text: part.text.clone(),
            image: part.image.as_ref().map(|i| i.describe()),
        });
    }

    fn show_typing(&mut self) {
        self.typing = true;
    }

    fn hide_typing(&mut self) {
        self.typing = false;
    }

    fn render_history(&mut self, sessions: &[SessionSummary], active: Option<&SessionId>) {
        self.sessions = sessions.to_vec();
        self.active = active.cloned();
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
    }
}

/// Which keys the event loop is listening for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Typing messages
    Insert,
    /// Waiting for y/n before deleting all history
    ConfirmClear,
}

/// Application state
pub struct App {
    pub controller: ConversationController<TuiView>,
    pub state: AppState,
    /// Is the app running?
    pub running: bool,
    pub show_sidebar: bool,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll_offset: u16,
    pub status_message: Option<String>,
    /// Endpoint shown in the header
    pub endpoint: String,
    pub tick: Duration,
}

impl App {
    pub fn new(
        controller: ConversationController<TuiView>,
        endpoint: impl Into<String>,
        show_sidebar: bool,
        tick: Duration,
    ) -> Self {
        Self {
            controller,
            state: AppState::Insert,
            running: true,
            show_sidebar,
            scroll_offset: 0,
            status_message: None,
            endpoint: endpoint.into(),
            tick,
        }
    }

    pub fn view(&self) -> &TuiView {
        self.controller.view()
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.controller.view_mut().input
    }

    /// Title of the active session
    pub fn title(&self) -> &str {
        self.controller
            .active_session()
            .map(|s| s.title.as_str())
            .unwrap_or("")
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ImageRef;

    #[test]
    fn test_view_tracks_controller_pushes() {
        let mut view = TuiView::default();
        view.input = "draft".to_string();

        view.render_turn(Role::User, &Part::text("hi"));
        view.render_turn(
            Role::Model,
            &Part::with_image("", ImageRef::Inline(vec![1, 2])),
        );
        view.show_typing();
        view.clear_input();

        assert_eq!(view.messages.len(), 2);
        assert_eq!(view.messages[1].image.as_deref(), Some("[image: 2 bytes]"));
        assert!(view.typing);
        assert!(view.input.is_empty());

        view.clear_messages();
        assert!(view.messages.is_empty());
        assert!(!view.typing);
    }
}
