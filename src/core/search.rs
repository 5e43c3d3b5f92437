use crate::config::Config;
use crate::core::duration::parse_iso_duration;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub caption: bool,
    pub duration: String,
    pub seconds: Option<u64>,
}

impl VideoRecord {
    pub fn link(&self) -> String {
        format!("{WATCH_URL}{}", self.video_id)
    }

    /// Whole days between publication and `now`.
    pub fn days_since_publish(&self, now: DateTime<Utc>) -> i64 {
        (now - self.published_at).num_days()
    }
}

/// One search invocation: records in publish-time order plus the raw
/// platform responses they were built from.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub videos: Vec<VideoRecord>,
    /// Search hits for which the statistics call returned nothing.
    pub unmatched: Vec<String>,
    pub raw_search: serde_json::Value,
    pub raw_videos: serde_json::Value,
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, topic: &str, limit: u32) -> Result<SearchOutcome>;
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct YouTubeSearchClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl YouTubeSearchClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            api_base: config.youtube_api_base.trim_end_matches('/').to_string(),
            api_key: config.youtube_api_key()?.to_string(),
        })
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        let url = format!("{}/{endpoint}", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(Error::Platform {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearchClient {
    async fn search(&self, topic: &str, limit: u32) -> Result<SearchOutcome> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        tracing::info!(topic, limit, "searching videos");

        let raw_search = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet".to_string()),
                    ("type", "video".to_string()),
                    ("q", topic.to_string()),
                    ("maxResults", limit.to_string()),
                ],
            )
            .await?;
        let search: SearchListResponse = serde_json::from_value(raw_search.clone())?;

        let ids: Vec<&str> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect();

        if ids.is_empty() {
            return Ok(SearchOutcome {
                raw_search,
                ..SearchOutcome::default()
            });
        }

        let raw_videos = self
            .get_json(
                "videos",
                &[
                    ("part", "statistics,contentDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;
        let details: VideoListResponse = serde_json::from_value(raw_videos.clone())?;

        let (videos, unmatched) = merge_results(search.items, details.items);
        if !unmatched.is_empty() {
            tracing::warn!(?unmatched, "search results without statistics were dropped");
        }

        Ok(SearchOutcome {
            videos: by_publish_time(videos),
            unmatched,
            raw_search,
            raw_videos,
        })
    }
}

fn merge_results(
    search: Vec<SearchItem>,
    details: Vec<VideoItem>,
) -> (Vec<VideoRecord>, Vec<String>) {
    let mut by_id: HashMap<String, VideoItem> = details
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let mut videos = Vec::new();
    let mut unmatched = Vec::new();
    let mut seen = HashSet::new();

    for item in search {
        let Some(video_id) = item.id.video_id else {
            continue;
        };
        // Repeated hits are listed once
        if !seen.insert(video_id.clone()) {
            continue;
        }
        let Some(detail) = by_id.remove(&video_id) else {
            unmatched.push(video_id);
            continue;
        };

        let duration = detail.content_details.duration.unwrap_or_default();
        videos.push(VideoRecord {
            seconds: parse_iso_duration(&duration),
            duration,
            caption: detail.content_details.caption.as_deref() == Some("true"),
            views: parse_count(detail.statistics.view_count.as_deref()),
            likes: parse_count(detail.statistics.like_count.as_deref()),
            title: html_escape::decode_html_entities(&item.snippet.title).into_owned(),
            thumbnail: item
                .snippet
                .thumbnails
                .default
                .map(|t| t.url)
                .unwrap_or_default(),
            published_at: item.snippet.published_at,
            video_id,
        });
    }

    (videos, unmatched)
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}

/// Newest first. Stable, so equal timestamps keep platform ranking.
pub fn by_publish_time(mut videos: Vec<VideoRecord>) -> Vec<VideoRecord> {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    videos
}

/// Keeps only captioned videos, most viewed first (stable).
pub fn captioned_by_views(videos: &[VideoRecord]) -> Vec<VideoRecord> {
    let mut kept: Vec<VideoRecord> = videos.iter().filter(|v| v.caption).cloned().collect();
    kept.sort_by(|a, b| b.views.cmp(&a.views));
    kept
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn record(id: &str, views: u64, caption: bool, day: u32) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            title: format!("Video {id}"),
            thumbnail: format!("https://i.ytimg.com/vi/{id}/default.jpg"),
            published_at: Utc.with_ymd_and_hms(2024, 9, day, 12, 0, 0).unwrap(),
            views,
            likes: views / 10,
            caption,
            duration: "PT1M".to_string(),
            seconds: Some(60),
        }
    }

    fn config_for(server: &MockServer) -> Config {
        Config {
            youtube_api_key: Some("test-key".to_string()),
            youtube_api_base: server.uri(),
            ..Config::default()
        }
    }

    #[test]
    fn filter_keeps_only_captioned_sorted_by_views() {
        let videos = vec![
            record("a", 100, true, 1),
            record("b", 500, false, 2),
            record("c", 50, true, 3),
        ];

        let kept = captioned_by_views(&videos);
        let ids: Vec<&str> = kept.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(kept.iter().all(|v| v.caption));
    }

    #[test]
    fn view_ties_keep_input_order() {
        let videos = vec![
            record("first", 10, true, 1),
            record("second", 10, true, 2),
            record("top", 99, true, 3),
        ];
        let ids: Vec<String> = captioned_by_views(&videos)
            .into_iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec!["top", "first", "second"]);
    }

    #[test]
    fn publish_order_is_newest_first() {
        let videos = vec![record("old", 1, true, 1), record("new", 1, true, 20)];
        let ordered = by_publish_time(videos);
        assert_eq!(ordered[0].video_id, "new");
    }

    #[test]
    fn derived_fields() {
        let video = record("PZ7lDrwYdZc", 1, true, 1);
        assert_eq!(video.link(), "https://www.youtube.com/watch?v=PZ7lDrwYdZc");
        let now = Utc.with_ymd_and_hms(2024, 9, 11, 13, 0, 0).unwrap();
        assert_eq!(video.days_since_publish(now), 10);
    }

    #[test]
    fn missing_counts_default_to_zero() {
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_count(Some("abc")), 0);
        assert_eq!(parse_count(Some("18402665")), 18402665);
    }

    #[tokio::test]
    async fn search_merges_statistics_and_drops_unmatched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "video"))
            .and(query_param("q", "Top Universities in Europe"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": {"kind": "youtube#video", "videoId": "older"},
                        "snippet": {
                            "title": "Older &amp; wiser",
                            "publishedAt": "2023-01-01T00:00:00Z",
                            "thumbnails": {"default": {"url": "https://img/older.jpg"}}
                        }
                    },
                    {
                        "id": {"kind": "youtube#video", "videoId": "newer"},
                        "snippet": {
                            "title": "Newer",
                            "publishedAt": "2024-01-01T00:00:00Z",
                            "thumbnails": {}
                        }
                    },
                    {
                        "id": {"kind": "youtube#video", "videoId": "ghost"},
                        "snippet": {
                            "title": "Gone",
                            "publishedAt": "2024-06-01T00:00:00Z"
                        }
                    }
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "older,newer,ghost"))
            .and(query_param("part", "statistics,contentDetails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "newer",
                        "contentDetails": {"duration": "PT28M11S", "caption": "true"},
                        "statistics": {"viewCount": "18402665", "likeCount": "715738"}
                    },
                    {
                        "id": "older",
                        "contentDetails": {"duration": "bogus", "caption": "false"},
                        "statistics": {"viewCount": "12"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = YouTubeSearchClient::new(&config_for(&server)).unwrap();
        let outcome = client.search("Top Universities in Europe", 20).await.unwrap();

        assert_eq!(outcome.unmatched, vec!["ghost".to_string()]);
        assert_eq!(outcome.videos.len(), 2);

        let newer = &outcome.videos[0];
        assert_eq!(newer.video_id, "newer");
        assert_eq!(newer.views, 18402665);
        assert_eq!(newer.likes, 715738);
        assert!(newer.caption);
        assert_eq!(newer.seconds, Some(1691));
        assert_eq!(newer.thumbnail, "");

        let older = &outcome.videos[1];
        assert_eq!(older.title, "Older & wiser");
        assert_eq!(older.likes, 0);
        assert!(!older.caption);
        assert_eq!(older.seconds, None);
        assert_eq!(older.thumbnail, "https://img/older.jpg");

        assert!(outcome.raw_search.get("items").is_some());
        assert!(outcome.raw_videos.get("items").is_some());
    }

    #[tokio::test]
    async fn empty_search_skips_statistics_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(0)
            .mount(&server)
            .await;

        let client = YouTubeSearchClient::new(&config_for(&server)).unwrap();
        let outcome = client.search("nothing", 5).await.unwrap();
        assert!(outcome.videos.is_empty());
    }

    #[tokio::test]
    async fn platform_errors_carry_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "quotaExceeded"}
            })))
            .mount(&server)
            .await;

        let client = YouTubeSearchClient::new(&config_for(&server)).unwrap();
        let err = client.search("anything", 5).await.unwrap_err();
        match err {
            Error::Platform { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "quotaExceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_hits_are_listed_once() {
        let hit = json!({
            "id": {"videoId": "v1"},
            "snippet": {"title": "Twice", "publishedAt": "2024-01-01T00:00:00Z"}
        });
        let search: Vec<SearchItem> =
            serde_json::from_value(json!([hit.clone(), hit])).unwrap();
        let details: Vec<VideoItem> = serde_json::from_value(json!([{
            "id": "v1",
            "statistics": {"viewCount": "10"},
            "contentDetails": {"duration": "PT10S", "caption": "true"}
        }]))
        .unwrap();

        let (videos, unmatched) = merge_results(search, details);

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].views, 10);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn client_requires_api_key() {
        assert!(YouTubeSearchClient::new(&Config::default()).is_err());
    }
}
