use crossterm::event::{KeyCode, KeyEvent};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct Viewer {
    pub title: String,
    lines: Vec<Line<'static>>,
    pub scroll: usize,
}

impl Viewer {
    /// Renders `content` as Markdown (headings, lists, emphasis, code).
    pub fn markdown(title: impl Into<String>, content: &str) -> Self {
        Self {
            title: title.into(),
            lines: markdown_lines(content),
            scroll: 0,
        }
    }

    pub fn plain(title: impl Into<String>, content: &str) -> Self {
        Self {
            title: title.into(),
            lines: content
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect(),
            scroll: 0,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn handle_key(&mut self, key: KeyEvent, area_height: u16) -> bool {
        let lines = self.lines.len();
        let page_size = (area_height as usize).saturating_sub(2);

        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                if self.scroll < lines.saturating_sub(page_size) {
                    self.scroll += 1;
                }
                true
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(page_size);
                true
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + page_size).min(lines.saturating_sub(page_size));
                true
            }
            KeyCode::Home => {
                self.scroll = 0;
                true
            }
            KeyCode::End => {
                self.scroll = lines.saturating_sub(page_size);
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let visible_lines = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(self.scroll)
            .take(visible_lines)
            .cloned()
            .collect();

        let total_lines = self.line_count();
        let scroll_info = if total_lines > visible_lines {
            format!(
                " (lines {}-{} of {})",
                self.scroll + 1,
                (self.scroll + visible_lines).min(total_lines),
                total_lines
            )
        } else {
            String::new()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{scroll_info}", self.title));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }
}

fn flush(current: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>) {
    if !current.is_empty() {
        lines.push(Line::from(std::mem::take(current)));
    }
}

fn blank(lines: &mut Vec<Line<'static>>) {
    if lines.last().is_some_and(|l| !l.spans.is_empty()) {
        lines.push(Line::default());
    }
}

pub fn markdown_lines(markdown: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut styles: Vec<Style> = vec![Style::default()];
    let mut lists: Vec<Option<u64>> = Vec::new();

    let style_of = |styles: &[Style]| styles.last().copied().unwrap_or_default();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                flush(&mut current, &mut lines);
                styles.push(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );
            }
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut current, &mut lines);
                styles.pop();
                lines.push(Line::default());
            }
            Event::End(TagEnd::Paragraph) => {
                flush(&mut current, &mut lines);
                if lists.is_empty() {
                    blank(&mut lines);
                }
            }
            Event::Start(Tag::List(start)) => {
                flush(&mut current, &mut lines);
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                flush(&mut current, &mut lines);
                lists.pop();
                if lists.is_empty() {
                    blank(&mut lines);
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut current, &mut lines);
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                let bullet = match lists.last_mut() {
                    Some(Some(n)) => {
                        let b = format!("{n}. ");
                        *n += 1;
                        b
                    }
                    _ => "• ".to_string(),
                };
                current.push(Span::styled(
                    format!("{indent}{bullet}"),
                    Style::default().fg(Color::Green),
                ));
            }
            Event::End(TagEnd::Item) => flush(&mut current, &mut lines),
            Event::Start(Tag::Emphasis) => {
                let style = style_of(&styles).add_modifier(Modifier::ITALIC);
                styles.push(style);
            }
            Event::Start(Tag::Strong) => {
                let style = style_of(&styles).add_modifier(Modifier::BOLD);
                styles.push(style);
            }
            Event::End(TagEnd::Emphasis) | Event::End(TagEnd::Strong) => {
                styles.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut current, &mut lines);
                styles.push(Style::default().fg(Color::Cyan));
            }
            Event::End(TagEnd::CodeBlock) => {
                flush(&mut current, &mut lines);
                styles.pop();
                blank(&mut lines);
            }
            Event::Text(text) => {
                let style = style_of(&styles);
                for (idx, segment) in text.split('\n').enumerate() {
                    if idx > 0 {
                        flush(&mut current, &mut lines);
                    }
                    if !segment.is_empty() {
                        current.push(Span::styled(segment.to_string(), style));
                    }
                }
            }
            Event::Code(code) => {
                current.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::Cyan),
                ));
            }
            Event::SoftBreak => current.push(Span::raw(" ")),
            Event::HardBreak | Event::Rule => flush(&mut current, &mut lines),
            _ => {}
        }
    }

    flush(&mut current, &mut lines);
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn renders_headings_and_lists() {
        let lines = markdown_lines(
            "## Summary\n\nUniversities **rank** well.\n\n## Questions\n\n1. What?\n2. Why?\n\n- a\n- b\n",
        );
        let texts: Vec<String> = lines.iter().map(text_of).collect();

        assert_eq!(texts[0], "Summary");
        assert!(texts.contains(&"Universities rank well.".to_string()));
        assert!(texts.contains(&"1. What?".to_string()));
        assert!(texts.contains(&"2. Why?".to_string()));
        assert!(texts.contains(&"• a".to_string()));
        assert!(texts.contains(&"• b".to_string()));
        assert!(!texts.last().unwrap().is_empty());
    }

    #[test]
    fn heading_is_styled() {
        let lines = markdown_lines("# Title");
        assert_eq!(lines.len(), 1);
        assert!(
            lines[0].spans[0]
                .style
                .add_modifier
                .contains(Modifier::BOLD)
        );
    }

    #[test]
    fn scrolling_is_bounded() {
        let content = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut viewer = Viewer::plain("Raw", &content);
        assert_eq!(viewer.line_count(), 30);

        let end = KeyEvent::new(KeyCode::End, KeyModifiers::NONE);
        viewer.handle_key(end, 12);
        assert_eq!(viewer.scroll, 20);

        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        viewer.handle_key(down, 12);
        assert_eq!(viewer.scroll, 20);

        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        viewer.handle_key(up, 12);
        assert_eq!(viewer.scroll, 19);
    }
}
