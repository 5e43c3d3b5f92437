use crate::config::Config;
use crate::core::request::RequestDocument;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Field names the service may use for the generated text.
const RESULT_FIELDS: &[&str] = &["result", "generated_content"];

/// What the summarization service returned: the body verbatim plus the
/// generated text pulled out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDocument {
    pub raw: serde_json::Value,
    pub text: String,
}

impl ResultDocument {
    pub fn from_json(raw: serde_json::Value) -> Result<Self> {
        let text = RESULT_FIELDS
            .iter()
            .find_map(|field| raw.get(*field).and_then(|v| v.as_str()))
            .map(str::to_string)
            .ok_or_else(|| Error::Remote {
                message: "response has no `result` field".to_string(),
            })?;

        Ok(Self { raw, text })
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn generate_report(&self, request: &RequestDocument) -> Result<ResultDocument>;
}

#[derive(Clone)]
pub struct ReportService {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl ReportService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.summarize_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.summarize_url()?.to_string(),
            token: config.summarize_token.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for ReportService {
    async fn generate_report(&self, request: &RequestDocument) -> Result<ResultDocument> {
        tracing::info!(endpoint = %self.endpoint, transcripts = request.transcripts.len(), "calling summarization service");

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "summarization service failed");
            return Err(Error::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value = response.json().await?;
        ResultDocument::from_json(raw)
    }
}
