use crate::config::Config;
use crate::core::report::{ReportService, ResultDocument, Summarizer};
use crate::core::request::compose_request;
use crate::core::search::{SearchOutcome, VideoRecord, VideoSearch, YouTubeSearchClient, captioned_by_views};
use crate::core::storage::{BlobSink, RunFolder, sink_from_config};
use crate::core::transcript::{TranscriptOutcome, TranscriptService, TranscriptSource, sanitize_video_id};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use derive_more::Display;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("Searching")]
    Searching,
    #[display("Filtering and sorting")]
    Filtering,
    #[display("Fetching transcripts")]
    Transcripts,
    #[display("Composing request")]
    Composing,
    #[display("Uploading request")]
    Uploading,
    #[display("Calling summarization service")]
    Calling,
    #[display("Rendering result")]
    Rendering,
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    Stage(Stage),
    Progress(f64),
    Log(String),
    Searched(SearchResults),
    TranscriptMissing { video_id: String, reason: String },
    Finished(Box<RunReport>),
    Failed(String),
}

pub type EventSender = mpsc::UnboundedSender<RunEvent>;

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub outcome: SearchOutcome,
    /// Captioned videos, most viewed first.
    pub retained: Vec<VideoRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptBlob {
    pub video_id: String,
    pub outcome: TranscriptOutcome,
    /// `None` when the id could not be turned into a storage path.
    pub uri: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub folder: RunFolder,
    pub retained: Vec<VideoRecord>,
    pub transcripts: Vec<TranscriptBlob>,
    pub request_uri: String,
    pub result_uri: String,
    pub result: ResultDocument,
}

struct Progress<'a>(Option<&'a EventSender>);

impl Progress<'_> {
    fn send(&self, event: RunEvent) {
        if let Some(tx) = self.0 {
            let _ = tx.send(event);
        }
    }

    fn stage(&self, stage: Stage, progress: f64) {
        self.send(RunEvent::Stage(stage));
        self.send(RunEvent::Progress(progress));
    }

    fn log(&self, message: impl Into<String>) {
        self.send(RunEvent::Log(message.into()));
    }

    fn missing(&self, video_id: &str, reason: &str) {
        self.log(format!("Warning: no transcript for {video_id}: {reason}"));
        self.send(RunEvent::TranscriptMissing {
            video_id: video_id.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Search, then keep captioned videos ordered by views.
pub async fn search_and_filter(
    search: &dyn VideoSearch,
    topic: &str,
    limit: u32,
) -> Result<SearchResults> {
    let outcome = search.search(topic, limit).await?;
    let retained = captioned_by_views(&outcome.videos);
    Ok(SearchResults { outcome, retained })
}

#[derive(Clone)]
pub struct Pipeline {
    search: Arc<dyn VideoSearch>,
    transcripts: Arc<dyn TranscriptSource>,
    sink: Arc<dyn BlobSink>,
    summarizer: Arc<dyn Summarizer>,
    limit: u32,
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        transcripts: Arc<dyn TranscriptSource>,
        sink: Arc<dyn BlobSink>,
        summarizer: Arc<dyn Summarizer>,
        limit: u32,
    ) -> Self {
        Self {
            search,
            transcripts,
            sink,
            summarizer,
            limit,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(YouTubeSearchClient::new(config)?),
            Arc::new(TranscriptService::new(config.transcript_languages.clone())?),
            Arc::from(sink_from_config(config)?),
            Arc::new(ReportService::new(config)?),
            config.max_results,
        ))
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Fetches one transcript and uploads it, empty when unavailable.
    async fn store_transcript(
        &self,
        folder: &RunFolder,
        video_id: String,
        progress: &Progress<'_>,
    ) -> Result<TranscriptBlob> {
        progress.log(format!("Fetching transcript for {video_id}..."));

        let outcome = self.transcripts.fetch(&video_id).await;
        if let TranscriptOutcome::Unavailable { reason } = &outcome {
            progress.missing(&video_id, reason);
        }

        let uri = self
            .sink
            .write_text(&folder.transcript_path(&video_id), outcome.text())
            .await?;
        progress.log(format!("Stored {uri}"));

        Ok(TranscriptBlob {
            video_id,
            outcome,
            uri: Some(uri),
        })
    }

    pub async fn run(&self, topic: &str, events: Option<&EventSender>) -> Result<RunReport> {
        self.run_at(topic, Utc::now(), events).await
    }

    /// One full cycle. Every step finishes before the next starts; a
    /// missing transcript is recorded and skipped, any other failure ends
    /// the run.
    pub async fn run_at(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
        events: Option<&EventSender>,
    ) -> Result<RunReport> {
        let progress = Progress(events);

        progress.stage(Stage::Searching, 0.05);
        progress.log(format!("Searching for \"{topic}\"..."));
        let results = search_and_filter(self.search.as_ref(), topic, self.limit).await?;

        progress.stage(Stage::Filtering, 0.15);
        progress.log(format!(
            "Found {} videos, {} with captions",
            results.outcome.videos.len(),
            results.retained.len()
        ));
        if !results.outcome.unmatched.is_empty() {
            progress.log(format!(
                "Skipped {} results without statistics: {}",
                results.outcome.unmatched.len(),
                results.outcome.unmatched.join(", ")
            ));
        }
        progress.send(RunEvent::Searched(results.clone()));

        let retained = results.retained;
        if retained.is_empty() {
            return Err(Error::custom(format!(
                "No videos with captions found for \"{topic}\""
            )));
        }

        let folder = RunFolder::new(started_at, topic);
        progress.stage(Stage::Transcripts, 0.2);

        let mut transcripts = Vec::with_capacity(retained.len());
        for (idx, video) in retained.iter().enumerate() {
            let blob = match sanitize_video_id(&video.video_id) {
                Ok(video_id) => self.store_transcript(&folder, video_id, &progress).await?,
                // No safe storage path exists for this id; nothing is uploaded
                Err(e) => {
                    let reason = e.to_string();
                    progress.missing(&video.video_id, &reason);
                    TranscriptBlob {
                        video_id: video.video_id.clone(),
                        outcome: TranscriptOutcome::Unavailable { reason },
                        uri: None,
                    }
                }
            };
            transcripts.push(blob);
            progress.send(RunEvent::Progress(
                0.2 + 0.5 * (idx + 1) as f64 / retained.len() as f64,
            ));
        }

        progress.stage(Stage::Composing, 0.72);
        let request = compose_request(
            topic,
            &retained,
            transcripts.iter().filter_map(|t| t.uri.clone()).collect(),
        );

        progress.stage(Stage::Uploading, 0.75);
        let request_uri = self
            .sink
            .write_json(&folder.request_path(), &request.to_json()?)
            .await?;
        progress.log(format!("Stored {request_uri}"));

        progress.stage(Stage::Calling, 0.8);
        let result = self.summarizer.generate_report(&request).await?;

        progress.stage(Stage::Rendering, 0.95);
        let result_uri = self
            .sink
            .write_json(&folder.result_path(), &result.raw)
            .await?;
        progress.log(format!("Stored {result_uri}"));
        progress.send(RunEvent::Progress(1.0));
        tracing::info!(folder = folder.as_str(), videos = retained.len(), "run finished");

        Ok(RunReport {
            folder,
            retained,
            transcripts,
            request_uri,
            result_uri,
            result,
        })
    }
}
