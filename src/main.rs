mod cli;
mod config;
mod core;
mod error;
mod render;
mod tui;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::core::{
    Pipeline, RunEvent, SearchResults, TranscriptService, VideoRecord, YouTubeSearchClient,
    extract_video_id, search_and_filter,
};
use crate::error::Result;
use crate::tui::{App, EventHandler, init as tui_init, restore as tui_restore, ui};
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const WRAP_WIDTH: usize = 100;
const DEFAULT_LOG_FILTER: &str = "qview=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = apply_overrides(Config::from_env(), &cli);

    match cli.command {
        Some(Commands::Search {
            topic,
            max_results,
            raw,
        }) => {
            init_logging();
            run_cli_search(&config, &topic, max_results, raw).await?;
        }
        Some(Commands::Run { topic, max_results }) => {
            init_logging();
            run_cli_run(&config, &topic, max_results).await?;
        }
        Some(Commands::Transcript { video_id }) => {
            init_logging();
            run_cli_transcript(&config, &video_id).await?;
        }
        Some(Commands::Tui) | None => {
            if cli.cli {
                println!("Use 'qview --help' for available commands");
            } else {
                run_tui(config).await?;
            }
        }
    }

    Ok(())
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(dir) = &cli.local_storage {
        config.local_storage_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.summarize_url {
        config.summarize_url = Some(url.clone());
    }
    config
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_cli_search(
    config: &Config,
    topic: &str,
    max_results: Option<u32>,
    raw: bool,
) -> Result<()> {
    let client = YouTubeSearchClient::new(config)?;
    let limit = max_results.unwrap_or(config.max_results);

    println!("Searching for \"{topic}\"...");
    let results = search_and_filter(&client, topic, limit).await?;

    if raw {
        println!("Search response:");
        println!("{}", serde_json::to_string_pretty(&results.outcome.raw_search)?);
        println!("Videos response:");
        println!("{}", serde_json::to_string_pretty(&results.outcome.raw_videos)?);
    }

    print_search_results(&results);
    Ok(())
}

async fn run_cli_run(config: &Config, topic: &str, max_results: Option<u32>) -> Result<()> {
    let mut pipeline = Pipeline::from_config(config)?;
    if let Some(limit) = max_results {
        pipeline = pipeline.with_limit(limit);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Stage(stage) => println!("==> {stage}"),
                RunEvent::Log(line) => println!("    {line}"),
                RunEvent::Searched(results) => print_search_results(&results),
                RunEvent::TranscriptMissing { video_id, reason } => {
                    eprintln!("warning: transcript unavailable for {video_id}: {reason}")
                }
                _ => {}
            }
        }
    });

    let outcome = pipeline.run(topic, Some(&tx)).await;
    drop(tx);
    let _ = printer.await;

    let report = outcome?;
    let fetched = report
        .transcripts
        .iter()
        .filter(|t| t.outcome.is_fetched())
        .count();

    println!();
    println!(
        "Run {}: {fetched}/{} transcripts fetched",
        report.folder.as_str(),
        report.retained.len()
    );
    println!("Request: {}", report.request_uri);
    println!("Result:  {}", report.result_uri);
    println!();
    println!("{}", render::wrap_text(&report.result.text, WRAP_WIDTH));

    Ok(())
}

async fn run_cli_transcript(config: &Config, video_input: &str) -> Result<()> {
    let video_id = extract_video_id(video_input)
        .ok_or_else(|| error::Error::custom("Invalid video URL or ID"))?;

    println!("Fetching transcript for: {video_id}");
    let service = TranscriptService::new(config.transcript_languages.clone())?;
    let transcript = service.fetch_transcript(&video_id).await?;

    println!(
        "{}",
        render::wrap_text(&TranscriptService::plain_text(&transcript), WRAP_WIDTH)
    );
    Ok(())
}

fn print_search_results(results: &SearchResults) {
    let all = &results.outcome.videos;
    if all.is_empty() {
        println!("No videos found.");
        return;
    }

    println!();
    println!("Results ({} videos):", all.len());
    println!("{}", render::results_header());
    for video in all {
        println!("{}", render::results_row(video));
    }

    println!();
    println!("Captioned videos by views ({}):", results.retained.len());
    let now = Utc::now();
    for video in &results.retained {
        print_card(video, now);
    }
}

fn print_card(video: &VideoRecord, now: chrono::DateTime<Utc>) {
    let lines = render::card_lines(video, now);
    println!();
    for (idx, line) in lines.iter().enumerate() {
        let marker = if idx == 0 { "┌" } else { "│" };
        println!("{marker} {line}");
    }
}

async fn run_tui(config: Config) -> Result<()> {
    // Initialize terminal
    let mut terminal = tui_init()?;

    let mut app = App::new(config);
    let event_handler = EventHandler::new();

    // Channel carrying run progress from the background task
    let (tx, rx) = mpsc::unbounded_channel();
    app.processing_tx = Some(tx);
    app.processing_rx = Some(rx);

    let outcome = tui_loop(&mut terminal, &mut app, &event_handler);

    // Restore terminal even if the loop failed
    tui_restore()?;
    outcome
}

fn tui_loop(terminal: &mut tui::Tui, app: &mut App, event_handler: &EventHandler) -> Result<()> {
    loop {
        let event = event_handler.next_event()?;
        app.handle_event(event)?;

        terminal.draw(|f| {
            ui::draw(f, app);
        })?;

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_filter_is_info() {
        assert_eq!(DEFAULT_LOG_FILTER, "qview=info");
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from(["qview", "--bucket", "other", "--summarize-url", "http://x"]);
        let config = apply_overrides(Config::default(), &cli);
        assert_eq!(config.bucket, "other");
        assert_eq!(config.summarize_url.as_deref(), Some("http://x"));
    }
}
