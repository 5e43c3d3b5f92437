use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qview")]
#[command(about = "Search YouTube on a topic and turn the captions into a summary and quiz")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Force CLI mode (skip TUI)
    #[arg(long)]
    pub cli: bool,

    /// Bucket holding run artifacts
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Write artifacts under this directory instead of Cloud Storage
    #[arg(long, global = true)]
    pub local_storage: Option<PathBuf>,

    /// Summarization service endpoint
    #[arg(long, global = true)]
    pub summarize_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search videos and list the captioned ones by views
    Search {
        /// Topic to search for
        topic: String,

        /// Number of search results to request
        #[arg(short, long)]
        max_results: Option<u32>,

        /// Also print the raw platform responses
        #[arg(long)]
        raw: bool,
    },

    /// Search, upload transcripts and generate a summary with quiz questions
    Run {
        /// Topic to search for
        topic: String,

        /// Number of search results to request
        #[arg(short, long)]
        max_results: Option<u32>,
    },

    /// Print the transcript of a single video
    Transcript {
        /// YouTube video URL or video ID
        video_id: String,
    },

    /// Open TUI interface
    Tui,
}
