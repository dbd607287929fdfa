use colored::Colorize;

use crate::chat::ChatView;
use crate::session::{Part, Role, SessionId, SessionSummary};

/// Plain stdout rendering for the non-interactive commands.
///
/// Starts muted so that opening a session does not dump its whole history;
/// call [`ConsoleView::set_live`] once output is wanted.
#[derive(Debug, Default)]
pub struct ConsoleView {
    live: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live(&mut self, live: bool) {
        self.live = live;
    }
}

/// Format one part the way the console prints it
pub fn format_part(role: Role, part: &Part) -> String {
    let label = match role {
        Role::User => "You".blue().bold(),
        Role::Model => "Model".magenta().bold(),
    };

    let mut body = part.text.trim_end().to_string();
    if let Some(image) = &part.image {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&image.describe().cyan().to_string());
    }

    format!("{}: {}", label, body)
}

impl ChatView for ConsoleView {
    fn clear_messages(&mut self) {}

    fn render_turn(&mut self, role: Role, part: &Part) {
        if self.live {
            println!("{}", format_part(role, part));
        }
    }

    fn show_typing(&mut self) {
        if self.live {
            eprintln!("{}", "...".dimmed());
        }
    }

    fn hide_typing(&mut self) {}

    fn render_history(&mut self, _sessions: &[SessionSummary], _active: Option<&SessionId>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ImageRef;

    #[test]
    fn test_format_part_includes_image_description() {
        colored::control::set_override(false);

        let part = Part::with_image("look", ImageRef::Inline(vec![0; 4]));
        assert_eq!(format_part(Role::Model, &part), "Model: look\n[image: 4 bytes]");

        let image_only = Part::with_image("", ImageRef::Url("https://x/y.png".to_string()));
        assert_eq!(
            format_part(Role::Model, &image_only),
            "Model: [image: https://x/y.png]"
        );

        assert_eq!(format_part(Role::User, &Part::text("hi\n")), "You: hi");
    }
}
