use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOPIC: &str = "Top Universities in Europe";
pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_GCS_API_BASE: &str = "https://storage.googleapis.com";
pub const DEFAULT_BUCKET: &str = "q-view";
const DEFAULT_MAX_RESULTS: u32 = 20;
const DEFAULT_SUMMARIZE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LANGUAGES: &str = "en,en-US,en-GB";

/// Everything the clients need, resolved once at startup and handed to each
/// component when it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub youtube_api_key: Option<String>,
    pub youtube_api_base: String,
    pub bucket: String,
    pub local_storage_dir: Option<PathBuf>,
    pub gcs_access_token: Option<String>,
    pub gcs_api_base: String,
    pub summarize_url: Option<String>,
    pub summarize_token: Option<String>,
    pub summarize_timeout: Duration,
    pub transcript_languages: Vec<String>,
    pub max_results: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            youtube_api_base: DEFAULT_YOUTUBE_API_BASE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            local_storage_dir: None,
            gcs_access_token: None,
            gcs_api_base: DEFAULT_GCS_API_BASE.to_string(),
            summarize_url: None,
            summarize_token: None,
            summarize_timeout: Duration::from_secs(DEFAULT_SUMMARIZE_TIMEOUT_SECS),
            transcript_languages: parse_languages(DEFAULT_LANGUAGES),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let gcs_access_token = get("GOOGLE_OAUTH_ACCESS_TOKEN");
        let summarize_token = get("QVIEW_SUMMARIZE_TOKEN").or_else(|| gcs_access_token.clone());

        Self {
            youtube_api_key: get("YOUTUBE_API_KEY"),
            youtube_api_base: get("QVIEW_YOUTUBE_API_BASE").unwrap_or(defaults.youtube_api_base),
            bucket: get("QVIEW_BUCKET").unwrap_or(defaults.bucket),
            local_storage_dir: get("QVIEW_STORAGE_DIR").map(PathBuf::from),
            gcs_access_token,
            gcs_api_base: get("QVIEW_GCS_API_BASE").unwrap_or(defaults.gcs_api_base),
            summarize_url: get("QVIEW_SUMMARIZE_URL"),
            summarize_token,
            summarize_timeout: get("QVIEW_SUMMARIZE_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.summarize_timeout),
            transcript_languages: get("QVIEW_TRANSCRIPT_LANGUAGES")
                .map(|v| parse_languages(&v))
                .filter(|langs| !langs.is_empty())
                .unwrap_or(defaults.transcript_languages),
            max_results: get("QVIEW_MAX_RESULTS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_results),
        }
    }

    pub fn youtube_api_key(&self) -> Result<&str> {
        self.youtube_api_key
            .as_deref()
            .ok_or_else(|| Error::config("YOUTUBE_API_KEY is not set"))
    }

    pub fn gcs_access_token(&self) -> Result<&str> {
        self.gcs_access_token.as_deref().ok_or_else(|| {
            Error::config(
                "GOOGLE_OAUTH_ACCESS_TOKEN is not set (or pass --local-storage to write to disk)",
            )
        })
    }

    pub fn summarize_url(&self) -> Result<&str> {
        self.summarize_url
            .as_deref()
            .ok_or_else(|| Error::config("QVIEW_SUMMARIZE_URL is not set"))
    }

    /// Human readable view of the settings with secrets masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("YouTube API key", mask(self.youtube_api_key.as_deref())),
            ("YouTube API base", self.youtube_api_base.clone()),
            ("Bucket", self.bucket.clone()),
            (
                "Storage",
                match &self.local_storage_dir {
                    Some(dir) => format!("local ({})", dir.display()),
                    None => format!("gcs ({})", self.gcs_api_base),
                },
            ),
            ("GCS access token", mask(self.gcs_access_token.as_deref())),
            (
                "Summarize URL",
                self.summarize_url
                    .clone()
                    .unwrap_or_else(|| "<not set>".to_string()),
            ),
            ("Summarize token", mask(self.summarize_token.as_deref())),
            (
                "Summarize timeout",
                format!("{}s", self.summarize_timeout.as_secs()),
            ),
            ("Transcript languages", self.transcript_languages.join(",")),
            ("Max results", self.max_results.to_string()),
        ]
    }
}

pub fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "<not set>".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => {
            let tail: String = s.chars().skip(s.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.max_results, 20);
        assert_eq!(config.transcript_languages, vec!["en", "en-US", "en-GB"]);
        assert!(config.youtube_api_key().is_err());
        assert!(config.summarize_url().is_err());
    }

    #[test]
    fn reads_values_and_falls_back_to_access_token() {
        let config = Config::from_lookup(lookup(&[
            ("YOUTUBE_API_KEY", "key-123"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
            ("QVIEW_BUCKET", "my-bucket"),
            ("QVIEW_MAX_RESULTS", "5"),
            ("QVIEW_TRANSCRIPT_LANGUAGES", "de, en"),
            ("QVIEW_SUMMARIZE_TIMEOUT_SECS", "12"),
        ]));

        assert_eq!(config.youtube_api_key().unwrap(), "key-123");
        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.transcript_languages, vec!["de", "en"]);
        assert_eq!(config.summarize_timeout, Duration::from_secs(12));
        assert_eq!(config.summarize_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[("YOUTUBE_API_KEY", "   ")]));
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn describe_masks_secrets() {
        let config = Config {
            youtube_api_key: Some("abcdefgh1234".to_string()),
            ..Config::default()
        };
        let described = config.describe();
        let key = described
            .iter()
            .find(|(name, _)| *name == "YouTube API key")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(key, "****1234");
    }
}
