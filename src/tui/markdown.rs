use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::theme::Theme;

struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push(&mut self, span: Span<'static>) {
        self.spans.push(span);
    }

    /// Finish the line being built, if any
    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn push_line(&mut self, line: Line<'static>) {
        self.flush();
        self.lines.push(line);
    }
}

/// Parse markdown and convert to styled ratatui Lines
pub fn parse_markdown(input: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let base = Style::default().fg(theme.foreground);
    let mut out = LineBuilder {
        lines: Vec::new(),
        spans: Vec::new(),
    };
    let mut style_stack = vec![base];
    let mut in_code_block = false;
    let mut code_block_content = String::new();
    let mut list_depth: usize = 0;

    for event in Parser::new_ext(input, options) {
        let current = style_stack.last().copied().unwrap_or(base);
        match event {
            Event::Start(tag) => {
                let new_style = match tag {
                    Tag::Heading { level, .. } => {
                        out.flush();
                        let prefix = match level {
                            HeadingLevel::H1 => "# ",
                            HeadingLevel::H2 => "## ",
                            HeadingLevel::H3 => "### ",
                            _ => "#### ",
                        };
                        out.push(Span::styled(prefix, theme.heading()));
                        theme.heading()
                    }
                    Tag::Emphasis => current.add_modifier(Modifier::ITALIC),
                    Tag::Strong => current.add_modifier(Modifier::BOLD),
                    Tag::Strikethrough => current.add_modifier(Modifier::CROSSED_OUT),
                    Tag::CodeBlock(kind) => {
                        in_code_block = true;
                        code_block_content.clear();
                        let lang = match kind {
                            CodeBlockKind::Fenced(lang) => lang.to_string(),
                            CodeBlockKind::Indented => String::new(),
                        };
                        out.push_line(Line::from(vec![
                            Span::styled("```", Style::default().fg(theme.muted)),
                            Span::styled(lang, Style::default().fg(theme.accent)),
                        ]));
                        Style::default().fg(theme.code_fg)
                    }
                    Tag::List(_) => {
                        list_depth += 1;
                        out.flush();
                        current
                    }
                    Tag::Item => {
                        if list_depth > 1 {
                            out.push(Span::raw("  ".repeat(list_depth - 1)));
                        }
                        out.push(Span::styled("• ", Style::default().fg(theme.accent)));
                        current
                    }
                    Tag::Link { .. } => {
                        Style::default()
                            .fg(theme.accent)
                            .add_modifier(Modifier::UNDERLINED)
                    }
                    Tag::BlockQuote(_) => {
                        out.flush();
                        out.push(Span::styled("│ ", Style::default().fg(theme.muted)));
                        Style::default()
                            .fg(theme.muted)
                            .add_modifier(Modifier::ITALIC)
                    }
                    _ => current,
                };
                style_stack.push(new_style);
            }
            Event::End(tag) => {
                style_stack.pop();
                match tag {
                    TagEnd::Heading(_)
                    | TagEnd::Paragraph
                    | TagEnd::Item
                    | TagEnd::BlockQuote(_)
                    | TagEnd::TableRow
                    | TagEnd::TableHead => out.flush(),
                    TagEnd::CodeBlock => {
                        in_code_block = false;
                        for line in code_block_content.lines() {
                            out.push_line(Line::from(Span::styled(
                                line.to_string(),
                                Style::default().fg(theme.code_fg),
                            )));
                        }
                        out.push_line(Line::from(Span::styled(
                            "```",
                            Style::default().fg(theme.muted),
                        )));
                        code_block_content.clear();
                    }
                    TagEnd::List(_) => {
                        list_depth = list_depth.saturating_sub(1);
                    }
                    TagEnd::TableCell => out.push(Span::styled(" │ ", Style::default().fg(theme.muted))),
                    _ => {}
                }
            }
            Event::Text(text) => {
                if in_code_block {
                    code_block_content.push_str(&text);
                } else {
                    out.push(Span::styled(text.to_string(), current));
                }
            }
            Event::Code(code) => {
                out.push(Span::styled(format!(" {} ", code), theme.inline_code()));
            }
            // Single line breaks are kept as line breaks in chat bubbles
            Event::SoftBreak | Event::HardBreak => out.flush(),
            Event::Rule => out.push_line(Line::from(Span::styled(
                "────────",
                Style::default().fg(theme.muted),
            ))),
            _ => {}
        }
    }

    out.flush();
    out.lines
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
    fn test_soft_breaks_become_lines() {
        let lines = parse_markdown("first\nsecond", &Theme::dark());
        assert_eq!(plain(&lines), vec!["first", "second"]);
    }

    #[test]
    fn test_code_block() {
        let lines = parse_markdown("```rust\nfn main() {}\n```", &Theme::dark());
        assert_eq!(plain(&lines), vec!["```rust", "fn main() {}", "```"]);
    }

    #[test]
    fn test_list_and_emphasis() {
        let theme = Theme::dark();
        let lines = parse_markdown("- **bold** item\n- two", &theme);
        assert_eq!(plain(&lines), vec!["• bold item", "• two"]);

        let bold = &lines[0].spans[1];
        assert_eq!(bold.content, "bold");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_heading_and_inline_code() {
        let lines = parse_markdown("## Title\n\nuse `cargo`", &Theme::light());
        assert_eq!(plain(&lines), vec!["## Title", "use  cargo "]);
    }
}
