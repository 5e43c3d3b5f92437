use crate::core::VideoRecord;
use crate::render::truncate_to_width;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

pub struct VideoList {
    pub items: Vec<VideoRecord>,
    pub state: ListState,
    viewport_size: usize,
}

impl VideoList {
    pub fn new(items: Vec<VideoRecord>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }

        Self {
            items,
            state,
            viewport_size: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.previous();
                true
            }
            KeyCode::Down => {
                self.next();
                true
            }
            KeyCode::PageDown => {
                self.page_down();
                true
            }
            KeyCode::PageUp => {
                self.page_up();
                true
            }
            KeyCode::Home => {
                self.go_home();
                true
            }
            KeyCode::End => {
                self.go_end();
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.scroll_up();
                true
            }
            MouseEventKind::ScrollDown => {
                self.scroll_down();
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        };
        self.state.select(Some(i));
        self.adjust_offset();
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
        self.adjust_offset();
    }

    fn page_down(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let step = self.viewport_size.max(1);
        let current = self.state.selected().unwrap_or(0);
        let new_index = (current + step).min(self.items.len() - 1);
        self.state.select(Some(new_index));
        self.adjust_offset();
    }

    fn page_up(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let step = self.viewport_size.max(1);
        let current = self.state.selected().unwrap_or(0);
        self.state.select(Some(current.saturating_sub(step)));
        self.adjust_offset();
    }

    fn go_home(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.state.select(Some(0));
        self.adjust_offset();
    }

    fn go_end(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.state.select(Some(self.items.len() - 1));
        self.adjust_offset();
    }

    fn scroll_up(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let current = self.state.selected().unwrap_or(0);
        self.state.select(Some(current.saturating_sub(1)));
        self.adjust_offset();
    }

    fn scroll_down(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let current = self.state.selected().unwrap_or(0);
        let new_index = (current + 1).min(self.items.len() - 1);
        self.state.select(Some(new_index));
        self.adjust_offset();
    }

    pub fn get_selected(&self) -> Option<&VideoRecord> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        self.viewport_size = area.height.saturating_sub(2) as usize;
        if self.viewport_size == 0 {
            self.viewport_size = 1;
        }
        self.adjust_offset();

        let title_width = (area.width as usize).saturating_sub(22).max(8);
        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, video)| {
                let line = Line::from(vec![
                    Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::Gray)),
                    Span::styled(
                        truncate_to_width(&video.title, title_width),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("  {} views", video.views),
                        Style::default().fg(Color::Cyan),
                    ),
                ]);

                ListItem::new(line)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(list, area, &mut self.state);
    }

    pub fn update_items(&mut self, new_items: Vec<VideoRecord>) {
        let current_selected = self.state.selected();
        self.items = new_items;

        if self.items.is_empty() {
            self.state.select(None);
        } else if let Some(selected) = current_selected {
            if selected >= self.items.len() {
                self.state.select(Some(self.items.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }

        self.adjust_offset();
    }

    fn adjust_offset(&mut self) {
        if self.items.is_empty() {
            *self.state.offset_mut() = 0;
            return;
        }

        let viewport = self.viewport_size.max(1);
        let max_index = self.items.len() - 1;
        let selected = self
            .state
            .selected()
            .map(|idx| idx.min(max_index))
            .unwrap_or(0);
        self.state.select(Some(selected));

        let max_offset = self.items.len().saturating_sub(viewport);
        let offset = self.state.offset().min(max_offset);
        *self.state.offset_mut() = offset;

        if selected < offset {
            *self.state.offset_mut() = selected;
        } else if selected >= offset + viewport {
            *self.state.offset_mut() = selected + 1 - viewport;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::search::tests::record;

    #[test]
    fn navigation_wraps_around() {
        let mut list = VideoList::new(vec![record("a", 3, true, 1), record("b", 2, true, 2)]);
        assert_eq!(list.get_selected().map(|v| v.video_id.as_str()), Some("a"));
        list.previous();
        assert_eq!(list.get_selected().map(|v| v.video_id.as_str()), Some("b"));
        list.next();
        assert_eq!(list.get_selected().map(|v| v.video_id.as_str()), Some("a"));
    }

    #[test]
    fn update_clamps_selection() {
        let mut list = VideoList::new(vec![
            record("a", 3, true, 1),
            record("b", 2, true, 2),
            record("c", 1, true, 3),
        ]);
        list.go_end();
        list.update_items(vec![record("x", 1, true, 1)]);
        assert_eq!(list.get_selected().map(|v| v.video_id.as_str()), Some("x"));

        list.update_items(Vec::new());
        assert!(list.get_selected().is_none());
    }
}
