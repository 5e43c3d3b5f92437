use crate::error::{Error, Result};
use async_trait::async_trait;
use yt_transcript_rs::{FetchedTranscript, api::YouTubeTranscriptApi};

/// Result of fetching captions for a single video. A missing transcript is
/// an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutcome {
    Fetched { text: String },
    Unavailable { reason: String },
}

impl TranscriptOutcome {
    /// Text to store; empty when captions could not be fetched.
    pub fn text(&self) -> &str {
        match self {
            Self::Fetched { text } => text,
            Self::Unavailable { .. } => "",
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> TranscriptOutcome;
}

#[derive(Clone)]
pub struct TranscriptService {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl TranscriptService {
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::custom(format!("Failed to initialise transcript client: {e}")))?;
        Ok(Self { api, languages })
    }

    pub async fn fetch_transcript(&self, video_id: &str) -> Result<FetchedTranscript> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        match self.api.fetch_transcript(video_id, &languages, false).await {
            Ok(transcript) => Ok(transcript),
            Err(e) => Err(Error::custom(format!("Failed to fetch transcript: {e}"))),
        }
    }

    /// Caption snippets joined into one plain-text block.
    pub fn plain_text(transcript: &FetchedTranscript) -> String {
        join_snippets(transcript.snippets.iter().map(|s| s.text.as_str()))
    }
}

#[async_trait]
impl TranscriptSource for TranscriptService {
    async fn fetch(&self, video_id: &str) -> TranscriptOutcome {
        let video_id = match sanitize_video_id(video_id) {
            Ok(id) => id,
            Err(e) => {
                return TranscriptOutcome::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        match self.fetch_transcript(&video_id).await {
            Ok(transcript) => TranscriptOutcome::Fetched {
                text: Self::plain_text(&transcript),
            },
            Err(e) => {
                tracing::warn!(%video_id, error = %e, "transcript unavailable");
                TranscriptOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn join_snippets<'a>(snippets: impl Iterator<Item = &'a str>) -> String {
    snippets
        .map(|text| html_escape::decode_html_entities(text.trim()).into_owned())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_video_id(url: &str) -> Option<String> {
    // Extract video ID from various YouTube URL formats
    let raw_id = if let Some(v_param) = url.split("v=").nth(1) {
        v_param.split('&').next().unwrap_or(v_param)
    } else if let Some(youtu_be) = url.split("youtu.be/").nth(1) {
        youtu_be.split('?').next().unwrap_or(youtu_be)
    } else {
        url
    };

    sanitize_video_id(raw_id).ok()
}

const MAX_VIDEO_ID_LEN: usize = 128;

/// Ensure a video identifier is safe for downstream use (storage paths, API calls, etc.).
/// Only ASCII alphanumeric characters plus `_` and `-` are allowed.
pub fn sanitize_video_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::custom("Video ID cannot be empty"));
    }

    if trimmed.len() > MAX_VIDEO_ID_LEN {
        return Err(Error::custom("Video ID is unexpectedly long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::custom(
            "Video ID contains unsupported characters; expected only letters, numbers, '-' or '_'",
        ));
    }

    Ok(trimmed.to_string())
}
