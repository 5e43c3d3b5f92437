use crate::render;
use crate::tui::app::{App, AppState, HOME_OPTIONS};
use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Wrap},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    match &app.state {
        AppState::Home => draw_home(f, app),
        AppState::NewRun => draw_new_run(f, app),
        AppState::Processing { topic } => {
            let topic = topic.clone();
            draw_processing(f, app, &topic)
        }
        AppState::Results => draw_results(f, app),
        AppState::Viewer => draw_viewer(f, app),
        AppState::Settings => draw_settings(f, app),
    }
}

fn title_bar(f: &mut Frame, area: Rect, text: &str) {
    let title = Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn help_bar(f: &mut Frame, area: Rect, text: &str) {
    let help = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, area);
}

fn draw_home(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Tagline
            Constraint::Min(1),    // Menu
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    title_bar(f, chunks[0], "Q-View");

    let tagline = Paragraph::new(
        "Search YouTube for a topic and summarize the captioned results with a quiz",
    )
    .style(Style::default().fg(Color::White))
    .alignment(Alignment::Center);
    f.render_widget(tagline, chunks[1]);

    let menu_items: Vec<ListItem> = HOME_OPTIONS
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let selected = i == app.selected_option;
            let disabled = i == 1 && app.search.is_none();
            let style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if selected { "●" } else { "○" };

            ListItem::new(Line::from(Span::styled(format!("{marker} {option}"), style)))
        })
        .collect();

    let menu = List::new(menu_items).block(Block::default().borders(Borders::ALL).title("Mode"));
    f.render_widget(menu, chunks[2]);

    help_bar(f, chunks[3], "[↑↓] Navigate  [Enter] Select  [q] Exit");
}

fn draw_new_run(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Topic input
            Constraint::Length(3), // Result count
            Constraint::Min(1),    // Notice
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    title_bar(f, chunks[0], "New Run");

    app.topic_input.render(f, chunks[1]);
    app.count_input.render(f, chunks[2]);

    if let Some(notice) = &app.notice {
        let notice = Paragraph::new(notice.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(notice, chunks[3]);
    }

    help_bar(f, chunks[4], "[Enter] Next / Q-View  [Tab] Next field  [Esc] Back");
}

fn draw_processing(f: &mut Frame, app: &App, topic: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Progress area
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let title = if app.progress_bar.failed {
        "Run failed"
    } else {
        "Processing..."
    };
    title_bar(f, chunks[0], title);

    app.progress_bar.render(f, chunks[1], topic);

    let help = if app.running { "[Esc] Leave" } else { "[Esc] Back" };
    help_bar(f, chunks[2], help);
}

fn draw_results(f: &mut Frame, app: &mut App) {
    let table_height = app
        .search
        .as_ref()
        .map(|s| s.outcome.videos.len() as u16 + 3)
        .unwrap_or(3)
        .min(14);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Title
            Constraint::Length(table_height), // All results
            Constraint::Min(8),               // Cards
            Constraint::Length(3),            // Help
        ])
        .split(f.area());

    let heading = match &app.report {
        Some(report) => format!("Results: {}  ({})", app.topic, report.folder.as_str()),
        None => format!("Results: {}", app.topic),
    };
    title_bar(f, chunks[0], &heading);

    draw_results_table(f, app, chunks[1]);

    let card_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    app.video_list
        .render(f, card_chunks[0], "Captioned videos by views");
    draw_card(f, app, card_chunks[1]);

    let help = if app.report.is_some() {
        "[↑↓] Select  [Enter] Result  [w] Raw responses  [Esc] Home"
    } else {
        "[↑↓] Select  [w] Raw responses  [Esc] Home"
    };
    help_bar(f, chunks[3], help);
}

fn draw_results_table(f: &mut Frame, app: &App, area: Rect) {
    let videos = app
        .search
        .as_ref()
        .map(|s| s.outcome.videos.as_slice())
        .unwrap_or_default();

    let header = Row::new(vec![
        "Title",
        "Published At",
        "Duration",
        "Views",
        "Likes",
        "Caption",
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = videos
        .iter()
        .map(|video| {
            let style = if video.caption {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(video.title.clone()),
                Cell::from(render::published_label(video)),
                Cell::from(video.duration.clone()),
                Cell::from(video.views.to_string()),
                Cell::from(video.likes.to_string()),
                Cell::from(if video.caption { "☑" } else { "☐" }),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("All results ({})", videos.len())),
    );
    f.render_widget(table, area);
}

fn draw_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Video");

    let Some(video) = app.selected_video() else {
        let empty = Paragraph::new("No captioned videos")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let mut lines: Vec<Line> = render::card_lines(video, Utc::now())
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if i == 0 {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
            } else if i == 1 {
                Line::from(Span::styled(text, Style::default().fg(Color::Cyan)))
            } else {
                Line::from(text)
            }
        })
        .collect();

    if let Some(reason) = app.missing_transcript(&video.video_id) {
        lines.push(Line::from(Span::styled(
            format!("Transcript unavailable: {reason}"),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(uri) = app
        .report
        .as_ref()
        .and_then(|r| r.transcripts.iter().find(|t| t.video_id == video.video_id))
        .and_then(|t| t.uri.as_deref())
    {
        lines.push(Line::from(Span::styled(
            format!("Transcript {uri}"),
            Style::default().fg(Color::Green),
        )));
    }

    let card = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(card, area);
}

fn draw_viewer(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    if let Some(viewer) = &mut app.content_viewer {
        app.viewer_height = chunks[0].height;
        viewer.render(f, chunks[0]);
    }

    help_bar(
        f,
        chunks[1],
        "[↑↓] Scroll  [PgUp/PgDn] Page  [Home/End] Home/End  [Esc] Back",
    );
}

fn draw_settings(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Settings content
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    title_bar(f, chunks[0], "Settings");

    let items: Vec<ListItem> = app
        .config
        .describe()
        .into_iter()
        .map(|(name, value)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}  ", render::pad_to_width(name, 22)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(value),
            ]))
        })
        .collect();

    let settings = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Configuration (from environment and flags)"),
    );
    f.render_widget(settings, chunks[1]);

    help_bar(f, chunks[2], "[Esc] Back");
}
