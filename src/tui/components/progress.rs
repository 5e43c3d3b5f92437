use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

pub struct ProgressBar {
    pub progress: f64,
    pub message: String,
    pub logs: Vec<String>,
    pub max_logs: usize,
    pub failed: bool,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self {
            progress: 0.0,
            message: String::new(),
            logs: Vec::new(),
            max_logs: 200,
            failed: false,
        }
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn set_message(&mut self, message: String) {
        self.message = message;
    }

    pub fn add_log(&mut self, log: String) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let log_entry = format!("[{timestamp}] {log}");

        self.logs.push(log_entry);

        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    pub fn fail(&mut self, error: String) {
        self.failed = true;
        self.set_message("Failed".to_string());
        self.add_log(format!("Error: {error}"));
    }

    pub fn render(&self, f: &mut Frame, area: Rect, topic: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Topic
                Constraint::Length(3), // Progress bar
                Constraint::Length(3), // Status
                Constraint::Min(1),    // Logs
            ])
            .split(area);

        let topic_paragraph =
            Paragraph::new(format!("Topic: {topic}")).style(Style::default().fg(Color::White));
        f.render_widget(topic_paragraph, chunks[0]);

        let progress_percent = (self.progress * 100.0) as u16;
        let gauge_color = if self.failed { Color::Red } else { Color::Green };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(gauge_color))
            .percent(progress_percent);
        f.render_widget(gauge, chunks[1]);

        let status_color = if self.failed { Color::Red } else { Color::Yellow };
        let status_paragraph = Paragraph::new(format!("Status: {}", self.message))
            .style(Style::default().fg(status_color));
        f.render_widget(status_paragraph, chunks[2]);

        // Only the most recent lines that fit
        let visible = chunks[3].height.saturating_sub(2) as usize;
        let log_lines: Vec<Line> = self
            .logs
            .iter()
            .skip(self.logs.len().saturating_sub(visible))
            .map(|log| {
                if log.contains("Warning:") || log.contains("Error:") {
                    Line::from(Span::styled(log, Style::default().fg(Color::Red)))
                } else {
                    Line::from(Span::raw(log))
                }
            })
            .collect();

        let logs_paragraph =
            Paragraph::new(log_lines).block(Block::default().borders(Borders::ALL).title("Log"));
        f.render_widget(logs_paragraph, chunks[3]);
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.message.clear();
        self.logs.clear();
        self.failed = false;
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressBar;

    #[test]
    fn progress_is_clamped() {
        let mut bar = ProgressBar::new();
        bar.set_progress(1.7);
        assert_eq!(bar.progress, 1.0);
        bar.set_progress(-1.0);
        assert_eq!(bar.progress, 0.0);
    }

    #[test]
    fn log_is_bounded() {
        let mut bar = ProgressBar::new();
        bar.max_logs = 2;
        for i in 0..5 {
            bar.add_log(format!("line {i}"));
        }
        assert_eq!(bar.logs.len(), 2);
        assert!(bar.logs[1].ends_with("line 4"));
    }

    #[test]
    fn failure_is_logged() {
        let mut bar = ProgressBar::new();
        bar.fail("HTTP 500".to_string());
        assert!(bar.failed);
        assert_eq!(bar.message, "Failed");
        assert!(bar.logs[0].contains("Error: HTTP 500"));
        bar.reset();
        assert!(!bar.failed && bar.logs.is_empty());
    }
}
