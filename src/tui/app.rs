use crate::config::{Config, DEFAULT_TOPIC};
use crate::core::{Pipeline, RunEvent, RunReport, SearchResults, VideoRecord};
use crate::error::Result;
use crate::tui::components::{InputField, ProgressBar, VideoList, Viewer};
use crate::tui::events::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use std::collections::HashMap;
use tokio::sync::mpsc;

pub const HOME_OPTIONS: [&str; 3] = ["New Run", "Last Results", "Settings"];

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Home,
    NewRun,
    Processing { topic: String },
    Results,
    Viewer,
    Settings,
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,

    // Home screen
    pub selected_option: usize,

    // New run screen
    pub topic_input: InputField,
    pub count_input: InputField,
    pub input_focus: usize,
    pub notice: Option<String>,

    // Processing screen
    pub progress_bar: ProgressBar,
    pub running: bool,
    /// Set when the user left the processing screen; remaining events of
    /// that run are drained without being shown.
    pub detached: bool,

    // Results screen
    pub topic: String,
    pub search: Option<SearchResults>,
    pub video_list: VideoList,
    pub report: Option<RunReport>,
    /// Reason per video id whose transcript could not be fetched.
    pub missing_transcripts: HashMap<String, String>,

    // Viewer screen
    pub content_viewer: Option<Viewer>,
    pub viewer_height: u16,

    pub config: Config,

    // Async communication
    pub processing_tx: Option<mpsc::UnboundedSender<RunEvent>>,
    pub processing_rx: Option<mpsc::UnboundedReceiver<RunEvent>>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState::Home,
            should_quit: false,

            selected_option: 0,

            topic_input: InputField::new("Topic", "What should we search for?")
                .with_value(DEFAULT_TOPIC),
            count_input: InputField::new("Max results", "20")
                .numeric()
                .with_value(&config.max_results.to_string()),
            input_focus: 0,
            notice: None,

            progress_bar: ProgressBar::new(),
            running: false,
            detached: false,

            topic: String::new(),
            search: None,
            video_list: VideoList::new(Vec::new()),
            report: None,
            missing_transcripts: HashMap::new(),

            content_viewer: None,
            viewer_height: 0,

            config,

            processing_tx: None,
            processing_rx: None,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => {
                self.should_quit = true;
            }
            AppEvent::Key(key) => {
                self.handle_key(key)?;
            }
            AppEvent::Mouse(mouse) => {
                self.handle_mouse(mouse);
            }
            AppEvent::Tick => {
                self.handle_tick();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match &self.state {
            AppState::Home => self.handle_home_key(key),
            AppState::NewRun => self.handle_new_run_key(key),
            AppState::Processing { .. } => self.handle_processing_key(key),
            AppState::Results => self.handle_results_key(key),
            AppState::Viewer => self.handle_viewer_key(key),
            AppState::Settings => self.handle_settings_key(key),
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.state == AppState::Results {
            self.video_list.handle_mouse(mouse);
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                self.selected_option = self.selected_option.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_option < HOME_OPTIONS.len() - 1 {
                    self.selected_option += 1;
                }
            }
            KeyCode::Char('1') => self.selected_option = 0,
            KeyCode::Char('2') => self.selected_option = 1,
            KeyCode::Char('3') => self.selected_option = 2,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter => match self.selected_option {
                0 => self.open_new_run(),
                1 => {
                    if self.search.is_some() {
                        self.state = AppState::Results;
                    }
                }
                2 => self.state = AppState::Settings,
                _ => {}
            },
            _ => {}
        }
    }

    fn open_new_run(&mut self) {
        self.state = AppState::NewRun;
        self.input_focus = 0;
        self.topic_input.focused = true;
        self.count_input.focused = false;
    }

    fn handle_new_run_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Tab => {
                self.cycle_input_focus();
            }
            KeyCode::Enter => {
                if self.input_focus == 0 {
                    self.cycle_input_focus();
                } else {
                    self.start_processing();
                }
            }
            _ => {
                if self.input_focus == 0 {
                    self.topic_input.handle_key(key);
                } else {
                    self.count_input.handle_key(key);
                }
            }
        }
    }

    fn handle_processing_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            if self.running {
                self.detached = true;
            }
            self.state = if self.search.is_some() && !self.running {
                AppState::Results
            } else {
                AppState::NewRun
            };
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Enter | KeyCode::Char('r') => self.open_result(),
            KeyCode::Char('w') => self.open_raw_responses(),
            _ => {
                self.video_list.handle_key(key);
            }
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Results;
            }
            _ => {
                if let Some(viewer) = &mut self.content_viewer {
                    viewer.handle_key(key, self.viewer_height);
                }
            }
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.state = AppState::Home;
        }
    }

    pub fn handle_tick(&mut self) {
        let mut events = Vec::new();
        if let Some(rx) = &mut self.processing_rx {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        for event in events {
            self.apply_run_event(event);
        }
    }

    pub fn apply_run_event(&mut self, event: RunEvent) {
        if self.detached {
            if matches!(event, RunEvent::Finished(_) | RunEvent::Failed(_)) {
                self.running = false;
                self.detached = false;
            }
            return;
        }

        match event {
            RunEvent::Stage(stage) => self.progress_bar.set_message(stage.to_string()),
            RunEvent::Progress(progress) => self.progress_bar.set_progress(progress),
            RunEvent::Log(line) => self.progress_bar.add_log(line),
            RunEvent::Searched(results) => {
                self.video_list.update_items(results.retained.clone());
                self.search = Some(results);
            }
            RunEvent::TranscriptMissing { video_id, reason } => {
                self.missing_transcripts.insert(video_id, reason);
            }
            RunEvent::Finished(report) => {
                self.running = false;
                self.video_list.update_items(report.retained.clone());
                self.report = Some(*report);
                self.state = AppState::Results;
            }
            RunEvent::Failed(error) => {
                self.running = false;
                self.progress_bar.fail(error);
            }
        }
    }

    fn cycle_input_focus(&mut self) {
        self.input_focus = (self.input_focus + 1) % 2;
        self.topic_input.focused = self.input_focus == 0;
        self.count_input.focused = self.input_focus == 1;
    }

    fn start_processing(&mut self) {
        if self.running {
            self.notice = Some("A run is still in progress".to_string());
            return;
        }
        if !self.topic_input.is_valid() {
            self.notice = Some("Enter a topic first".to_string());
            return;
        }

        let limit = self
            .count_input
            .value
            .parse::<u32>()
            .unwrap_or(self.config.max_results);
        let pipeline = match Pipeline::from_config(&self.config) {
            Ok(pipeline) => pipeline.with_limit(limit),
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        let Some(tx) = self.processing_tx.clone() else {
            return;
        };

        let topic = self.topic_input.value.trim().to_string();
        self.notice = None;
        self.topic = topic.clone();
        self.search = None;
        self.report = None;
        self.missing_transcripts.clear();
        self.video_list.update_items(Vec::new());
        self.progress_bar.reset();
        self.progress_bar.set_message("Starting...".to_string());
        self.running = true;
        self.state = AppState::Processing {
            topic: topic.clone(),
        };

        tokio::spawn(async move {
            let event = match pipeline.run(&topic, Some(&tx)).await {
                Ok(report) => RunEvent::Finished(Box::new(report)),
                Err(e) => RunEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn open_result(&mut self) {
        if let Some(report) = &self.report {
            self.content_viewer = Some(Viewer::markdown(
                format!("Result: {}", report.folder.as_str()),
                &report.result.text,
            ));
            self.state = AppState::Viewer;
        }
    }

    fn open_raw_responses(&mut self) {
        let Some(results) = &self.search else {
            return;
        };
        let pretty = |value: &serde_json::Value| {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        };
        let mut content = format!(
            "# search\n{}\n\n# videos\n{}",
            pretty(&results.outcome.raw_search),
            pretty(&results.outcome.raw_videos)
        );
        if let Some(report) = &self.report {
            content.push_str(&format!("\n\n# result\n{}", pretty(&report.result.raw)));
        }
        self.content_viewer = Some(Viewer::plain("Raw responses", &content));
        self.state = AppState::Viewer;
    }

    pub fn selected_video(&self) -> Option<&VideoRecord> {
        self.video_list.get_selected()
    }

    pub fn missing_transcript(&self, video_id: &str) -> Option<&str> {
        self.missing_transcripts.get(video_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::search::tests::record;
    use crate::core::report::ResultDocument;
    use crate::core::storage::RunFolder;
    use crate::core::{SearchOutcome, Stage};
    use chrono::Utc;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn searched() -> SearchResults {
        let videos = vec![record("a", 100, true, 1), record("b", 500, false, 2)];
        SearchResults {
            retained: vec![videos[0].clone()],
            outcome: SearchOutcome {
                videos,
                ..SearchOutcome::default()
            },
        }
    }

    fn finished() -> RunEvent {
        RunEvent::Finished(Box::new(RunReport {
            folder: RunFolder::new(Utc::now(), "x"),
            retained: vec![record("a", 100, true, 1)],
            transcripts: Vec::new(),
            request_uri: "mem://request.json".to_string(),
            result_uri: "mem://result.json".to_string(),
            result: ResultDocument::from_json(json!({"result": "# Summary"})).unwrap(),
        }))
    }

    #[test]
    fn topic_is_prefilled() {
        let app = App::new(Config::default());
        assert_eq!(app.topic_input.value, DEFAULT_TOPIC);
        assert_eq!(app.count_input.value, "20");
    }

    #[test]
    fn missing_configuration_is_reported_without_starting() {
        let mut app = App::new(Config::default());
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.state, AppState::NewRun);

        app.handle_event(key(KeyCode::Tab)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.state, AppState::NewRun);
        assert!(!app.running);
        assert!(app.notice.as_deref().unwrap().contains("YOUTUBE_API_KEY"));
    }

    #[test]
    fn run_events_drive_the_screens() {
        let mut app = App::new(Config::default());
        app.running = true;
        app.state = AppState::Processing {
            topic: "x".to_string(),
        };

        app.apply_run_event(RunEvent::Stage(Stage::Searching));
        assert_eq!(app.progress_bar.message, "Searching");
        app.apply_run_event(RunEvent::Searched(searched()));
        assert_eq!(app.selected_video().map(|v| v.video_id.as_str()), Some("a"));

        app.apply_run_event(finished());
        assert_eq!(app.state, AppState::Results);
        assert!(!app.running);
        assert_eq!(app.selected_video().map(|v| v.video_id.as_str()), Some("a"));

        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.state, AppState::Viewer);
        app.handle_event(key(KeyCode::Esc)).unwrap();
        app.handle_event(key(KeyCode::Char('w'))).unwrap();
        assert_eq!(app.state, AppState::Viewer);
        assert_eq!(
            app.content_viewer.as_ref().map(|v| v.title.as_str()),
            Some("Raw responses")
        );
    }

    #[test]
    fn missing_transcripts_are_kept_per_video() {
        let mut app = App::new(Config::default());
        app.running = true;
        app.apply_run_event(RunEvent::Searched(searched()));
        app.apply_run_event(RunEvent::TranscriptMissing {
            video_id: "a".to_string(),
            reason: "captions disabled".to_string(),
        });

        assert_eq!(app.missing_transcript("a"), Some("captions disabled"));
        assert_eq!(app.missing_transcript("b"), None);
    }

    #[test]
    fn failure_stays_on_processing_screen() {
        let mut app = App::new(Config::default());
        app.running = true;
        app.state = AppState::Processing {
            topic: "x".to_string(),
        };

        app.apply_run_event(RunEvent::Failed("HTTP 500".to_string()));
        assert!(!app.running);
        assert!(app.progress_bar.failed);
        assert!(matches!(app.state, AppState::Processing { .. }));
    }

    #[test]
    fn detached_runs_are_drained_silently() {
        let mut app = App::new(Config::default());
        app.running = true;
        app.state = AppState::Processing {
            topic: "x".to_string(),
        };
        app.handle_event(key(KeyCode::Esc)).unwrap();
        assert!(app.detached);
        assert_eq!(app.state, AppState::NewRun);

        app.apply_run_event(RunEvent::Searched(searched()));
        assert!(app.search.is_none());
        app.apply_run_event(finished());
        assert!(!app.running);
        assert!(!app.detached);
        assert!(app.report.is_none());
    }
}
