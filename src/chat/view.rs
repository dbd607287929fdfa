use crate::session::{Part, Role, SessionId, SessionSummary};

/// Rendering surface driven by the conversation controller.
///
/// The controller pushes content; user input comes back only through the
/// controller's own operations.
pub trait ChatView {
    /// Drop every rendered message
    fn clear_messages(&mut self);

    /// Render one part of a turn: its text first, then its image if any
    fn render_turn(&mut self, role: Role, part: &Part);

    /// Show the "model is typing" placeholder
    fn show_typing(&mut self);

    /// Remove the typing placeholder if shown
    fn hide_typing(&mut self);

    /// Render the session list, newest first, with the active entry highlighted
    fn render_history(&mut self, sessions: &[SessionSummary], active: Option<&SessionId>);

    /// Empty the input box after a submission
    fn clear_input(&mut self) {}

    fn set_dark_mode(&mut self, _enabled: bool) {}
}
