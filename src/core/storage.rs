use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fs as std_fs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const TRANSCRIPT_SUFFIX: &str = ".txt";
pub const REQUEST_FILE: &str = "request.json";
pub const RESULT_FILE: &str = "result.json";

/// Folder holding every artifact of one run: `YYYYMMDD-HHMMSS[-topic]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFolder(String);

impl RunFolder {
    pub fn new(started_at: DateTime<Utc>, topic: &str) -> Self {
        let stamp = started_at.format("%Y%m%d-%H%M%S").to_string();
        let topic = topic.trim();
        if topic.is_empty() {
            Self(stamp)
        } else {
            Self(format!("{stamp}-{}", topic.replace(' ', "-")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn transcript_path(&self, video_id: &str) -> String {
        format!("{}/{video_id}{TRANSCRIPT_SUFFIX}", self.0)
    }

    pub fn request_path(&self) -> String {
        format!("{}/{REQUEST_FILE}", self.0)
    }

    pub fn result_path(&self) -> String {
        format!("{}/{RESULT_FILE}", self.0)
    }
}

/// Destination for run artifacts. Writes overwrite whatever is already
/// stored under the same path and return the reference handed downstream.
#[async_trait]
pub trait BlobSink: Send + Sync {
    fn uri(&self, path: &str) -> String;

    async fn write_text(&self, path: &str, content: &str) -> Result<String>;

    async fn write_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let content = serde_json::to_string_pretty(body)?;
        self.write_text(path, &content).await
    }
}

pub fn sink_from_config(config: &Config) -> Result<Box<dyn BlobSink>> {
    match &config.local_storage_dir {
        Some(dir) => Ok(Box::new(LocalSink::new(dir.clone(), &config.bucket))),
        None => Ok(Box::new(GcsSink::new(config)?)),
    }
}

/// Google Cloud Storage through the JSON upload API.
pub struct GcsSink {
    http: Client,
    api_base: String,
    bucket: String,
    token: String,
}

impl GcsSink {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            api_base: config.gcs_api_base.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            token: config.gcs_access_token()?.to_string(),
        })
    }

    async fn upload(&self, path: &str, content: &str, content_type: &str) -> Result<String> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.api_base, self.bucket);
        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content.to_owned())
            .send()
            .await
            .map_err(|e| Error::storage(self.uri(path), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::storage(
                self.uri(path),
                format!("upload failed with HTTP {}: {body}", status.as_u16()),
            ));
        }

        tracing::info!(path, bucket = %self.bucket, "uploaded blob");
        Ok(self.uri(path))
    }
}

#[async_trait]
impl BlobSink for GcsSink {
    fn uri(&self, path: &str) -> String {
        format!("gs://{}/{path}", self.bucket)
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<String> {
        self.upload(path, content, "text/plain; charset=utf-8").await
    }

    async fn write_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let content = serde_json::to_string_pretty(body)?;
        self.upload(path, &content, "application/json").await
    }
}

/// A directory standing in for a bucket: `<root>/<bucket>/<path>`.
pub struct LocalSink {
    base: PathBuf,
}

impl LocalSink {
    pub fn new(root: PathBuf, bucket: &str) -> Self {
        Self {
            base: root.join(bucket),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(Error::storage(
                path,
                "Refusing to write outside the storage directory",
            ));
        }
        Ok(self.base.join(relative))
    }
}

#[async_trait]
impl BlobSink for LocalSink {
    fn uri(&self, path: &str) -> String {
        self.base.join(path).display().to_string()
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            ensure_directory(parent).map_err(|e| Error::storage(path, e.to_string()))?;
        }

        // Handle is scoped to this block and closed before returning.
        {
            let mut file = fs::File::create(&target)
                .await
                .map_err(|e| Error::storage(path, e.to_string()))?;
            file.write_all(content.as_bytes())
                .await
                .map_err(|e| Error::storage(path, e.to_string()))?;
            file.flush()
                .await
                .map_err(|e| Error::storage(path, e.to_string()))?;
        }

        tracing::info!(path = %target.display(), "wrote blob");
        Ok(self.uri(path))
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    std_fs::create_dir_all(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = std_fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o777 != 0o700 {
            permissions.set_mode(0o700);
            std_fs::set_permissions(path, permissions)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 20, 14, 5, 9).unwrap()
    }

    #[test]
    fn run_folder_with_topic() {
        let folder = RunFolder::new(started(), "Top Universities in Europe");
        assert_eq!(folder.as_str(), "20240920-140509-Top-Universities-in-Europe");
        assert_eq!(
            folder.transcript_path("abc"),
            "20240920-140509-Top-Universities-in-Europe/abc.txt"
        );
        assert!(folder.request_path().ends_with("/request.json"));
        assert!(folder.result_path().ends_with("/result.json"));
    }

    #[test]
    fn run_folder_without_topic() {
        assert_eq!(RunFolder::new(started(), "  ").as_str(), "20240920-140509");
    }

    #[tokio::test]
    async fn local_sink_overwrites_and_round_trips_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(dir.path().to_path_buf(), "q-view");

        sink.write_text("run/a.txt", "first version that is longer")
            .await
            .unwrap();
        let uri = sink.write_text("run/a.txt", "Universität Zürich ✓").await.unwrap();

        let stored = std::fs::read_to_string(dir.path().join("q-view/run/a.txt")).unwrap();
        assert_eq!(stored, "Universität Zürich ✓");
        assert!(uri.ends_with("a.txt"));
    }

    #[tokio::test]
    async fn local_sink_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(dir.path().to_path_buf(), "bucket");
        sink.write_json("run/request.json", &json!({"topic": "x"}))
            .await
            .unwrap();

        let stored = std::fs::read_to_string(dir.path().join("bucket/run/request.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(value["topic"], "x");
    }

    #[tokio::test]
    async fn local_sink_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(dir.path().to_path_buf(), "bucket");
        let err = sink.write_text("../outside.txt", "x").await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    fn gcs_config(server: &MockServer) -> Config {
        Config {
            gcs_access_token: Some("token-1".to_string()),
            gcs_api_base: server.uri(),
            bucket: "q-view".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn gcs_sink_uploads_media() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/q-view/o"))
            .and(query_param("uploadType", "media"))
            .and(query_param("name", "run/abc.txt"))
            .and(header("authorization", "Bearer token-1"))
            .and(body_string("caption text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "run/abc.txt"})))
            .expect(1)
            .mount(&server)
            .await;

        let sink = GcsSink::new(&gcs_config(&server)).unwrap();
        let uri = sink.write_text("run/abc.txt", "caption text").await.unwrap();
        assert_eq!(uri, "gs://q-view/run/abc.txt");
    }

    #[tokio::test]
    async fn gcs_sink_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let sink = GcsSink::new(&gcs_config(&server)).unwrap();
        let err = sink.write_text("run/abc.txt", "x").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn gcs_sink_requires_token() {
        assert!(GcsSink::new(&Config::default()).is_err());
    }
}
