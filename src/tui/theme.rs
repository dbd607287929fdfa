use ratatui::style::{Color, Modifier, Style};

/// Colors for the TUI, one palette per dark-mode setting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub accent: Color,
    pub user: Color,
    pub model: Color,
    pub muted: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub code_fg: Color,
    pub code_bg: Color,
    pub image: Color,
    pub warning: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(17, 24, 39),
            foreground: Color::Rgb(229, 231, 235),
            border: Color::DarkGray,
            accent: Color::Cyan,
            user: Color::Rgb(236, 72, 153),
            model: Color::Rgb(129, 140, 248),
            muted: Color::Gray,
            highlight_bg: Color::Rgb(55, 65, 81),
            highlight_fg: Color::White,
            code_fg: Color::Yellow,
            code_bg: Color::Rgb(40, 40, 40),
            image: Color::Green,
            warning: Color::Red,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            border: Color::Gray,
            accent: Color::Blue,
            user: Color::Magenta,
            model: Color::Blue,
            muted: Color::DarkGray,
            highlight_bg: Color::Blue,
            highlight_fg: Color::White,
            code_fg: Color::Rgb(120, 60, 0),
            code_bg: Color::Rgb(235, 235, 235),
            image: Color::Green,
            warning: Color::Red,
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn heading(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn inline_code(&self) -> Style {
        Style::default().fg(self.code_fg).bg(self.code_bg)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mode() {
        assert_eq!(Theme::for_mode(true), Theme::dark());
        assert_eq!(Theme::for_mode(false), Theme::light());
        assert_ne!(Theme::dark().background, Theme::light().background);
    }
}
