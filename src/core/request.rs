use crate::core::search::VideoRecord;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact per-video entry sent to the summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub seconds: Option<u64>,
}

impl From<&VideoRecord> for VideoSummary {
    fn from(video: &VideoRecord) -> Self {
        Self {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            link: video.link(),
            published_at: video.published_at,
            views: video.views,
            likes: video.likes,
            seconds: video.seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub topic: String,
    pub videos: Vec<VideoSummary>,
    pub transcripts: Vec<String>,
    pub prompt: String,
}

impl RequestDocument {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn prompt_for(topic: &str) -> String {
    format!(
        "The attached transcripts come from YouTube videos about \"{topic}\".\n\
         Using only the content of these transcripts, produce exactly two deliverables:\n\
         1. A summary of the provided transcripts.\n\
         2. Ten questions about \"{topic}\", each followed by its answer, grounded in the transcripts.\n\
         Format the output as Markdown with a \"Summary\" section and a \"Questions\" section."
    )
}

pub fn compose_request(topic: &str, videos: &[VideoRecord], transcripts: Vec<String>) -> RequestDocument {
    RequestDocument {
        topic: topic.to_string(),
        videos: videos.iter().map(VideoSummary::from).collect(),
        transcripts,
        prompt: prompt_for(topic),
    }
}
