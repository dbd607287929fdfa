use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppState, DisplayMessage};
use super::markdown::parse_markdown;
use super::theme::Theme;
use crate::constants::CLEAR_ALL_PROMPT;
use crate::session::Role;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let theme = Theme::for_mode(app.view().dark_mode);
    frame.render_widget(Block::default().style(theme.base()), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(5),    // Main content
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app, &theme);

    let chat_area = if app.show_sidebar {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(chunks[1]);
        render_sidebar(frame, content[0], app, &theme);
        content[1]
    } else {
        chunks[1]
    };

    render_chat(frame, chat_area, app, &theme);
    render_input(frame, chunks[2], app, &theme);
    render_status_bar(frame, chunks[3], app, &theme);

    if app.state == AppState::ConfirmClear {
        render_confirmation(frame, &theme);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mode = if app.view().dark_mode { "dark" } else { "light" };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Parley", theme.heading()),
        Span::raw(" | "),
        Span::styled(app.title().to_string(), Style::default().fg(theme.foreground)),
        Span::raw(" | "),
        Span::styled(app.endpoint.clone(), Style::default().fg(theme.muted)),
        Span::raw(" | "),
        Span::styled(mode, Style::default().fg(theme.muted)),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme.border)),
    )
    .alignment(Alignment::Center);

    frame.render_widget(header, area);
}

/// Session list, newest first, active entry highlighted
fn render_sidebar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let view = app.view();
    let items: Vec<ListItem> = view
        .sessions
        .iter()
        .map(|summary| {
            let style = if view.active.as_ref() == Some(&summary.id) {
                theme.selected()
            } else {
                Style::default().fg(theme.foreground)
            };
            ListItem::new(Line::from(Span::styled(summary.title.clone(), style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(" History "),
    );
    frame.render_widget(list, area);
}

/// Styled transcript lines for every message plus the typing placeholder
pub fn transcript_lines(messages: &[DisplayMessage], typing: bool, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        lines.push(role_line(message.role, theme));
        if !message.text.is_empty() {
            match message.role {
                Role::Model => lines.extend(parse_markdown(&message.text, theme)),
                Role::User => lines.extend(message.text.lines().map(|l| {
                    Line::from(Span::styled(l.to_string(), Style::default().fg(theme.foreground)))
                })),
            }
        }
        if let Some(image) = &message.image {
            lines.push(Line::from(Span::styled(
                image.clone(),
                Style::default().fg(theme.image).add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(""));
    }

    if typing {
        lines.push(role_line(Role::Model, theme));
        lines.push(Line::from(Span::styled(
            "typing...",
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn role_line(role: Role, theme: &Theme) -> Line<'static> {
    let (label, color) = match role {
        Role::User => ("[You]", theme.user),
        Role::Model => ("[Model]", theme.model),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Rows needed to show `lines` wrapped at `width`
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let view = app.view();
    let lines = transcript_lines(&view.messages, view.typing, theme);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let bottom = total.saturating_sub(inner_height);
    let top = bottom.saturating_sub(app.scroll_offset);

    let chat = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((top, 0));
    frame.render_widget(chat, area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let waiting = app.controller.is_waiting();
    let title = if waiting {
        " Waiting for reply... "
    } else {
        " Message (Enter to send) "
    };
    let border = if waiting { theme.muted } else { theme.accent };

    let input = Paragraph::new(app.view().input.as_str())
        .style(Style::default().fg(theme.foreground))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
    frame.render_widget(input, area);

    if app.state == AppState::Insert {
        let last_line = app.view().input.rsplit('\n').next().unwrap_or("");
        let x = area.x + 1 + (last_line.chars().count() as u16).min(area.width.saturating_sub(3));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let text = match &app.status_message {
        Some(message) => message.clone(),
        None => "Ctrl+N new | Ctrl+Up/Down switch | Tab history | Ctrl+T theme | Ctrl+D clear all | Esc quit"
            .to_string(),
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(theme.muted)),
        area,
    );
}

fn render_confirmation(frame: &mut Frame, theme: &Theme) {
    let area = centered_rect(60, 7, frame.area());
    let body = vec![
        Line::from(Span::styled(
            CLEAR_ALL_PROMPT,
            Style::default().fg(theme.foreground),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
            Span::raw(" Delete everything   "),
            Span::styled("[n]", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
            Span::raw(" Cancel"),
        ]),
    ];

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body)
            .style(theme.base())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.warning))
                    .title(" Clear all history "),
            ),
        area,
    );
}

/// A rectangle `percent_x` wide and `height` tall in the middle of `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_transcript_layout() {
        let messages = vec![
            DisplayMessage {
                role: Role::User,
                text: "draw a cat".to_string(),
                image: None,
            },
            DisplayMessage {
                role: Role::Model,
                text: String::new(),
                image: Some("[image: 3 bytes]".to_string()),
            },
        ];

        let lines = transcript_lines(&messages, true, &Theme::dark());
        assert_eq!(
            plain(&lines),
            vec![
                "[You]",
                "draw a cat",
                "",
                "[Model]",
                "[image: 3 bytes]",
                "",
                "[Model]",
                "typing...",
            ]
        );
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("x".repeat(25)), Line::from("")];
        assert_eq!(wrapped_height(&lines, 10), 4);
        assert_eq!(wrapped_height(&lines, 0), 26);
    }
}
