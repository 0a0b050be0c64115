//! Sentiment analysis service client
//!
//! Sentiment is a best-effort enrichment. [`SentimentApi::classify`] never
//! fails: any error (empty text, timeout, bad status, unparseable body,
//! unknown label) resolves to [`FALLBACK_SENTIMENT`].

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("dealership-api/", env!("CARGO_PKG_VERSION"));

/// Label attached when classification is impossible
pub const FALLBACK_SENTIMENT: Sentiment = Sentiment::Neutral;

/// Closed set of sentiment labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Case-insensitive label parse
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// Reasons a classification fell back to the default label
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("No text to classify")]
    EmptyText,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Sentiment service returned {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unrecognized sentiment label {0:?}")]
    UnknownLabel(String),

    #[error("Invalid sentiment service URL: {0}")]
    InvalidUrl(String),
}

/// Sentiment service response body
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    sentiment: Option<String>,
}

/// Text classifier used by the review enricher
#[async_trait]
pub trait SentimentApi: Send + Sync {
    /// Label for `text`; [`FALLBACK_SENTIMENT`] on any failure
    async fn classify(&self, text: &str) -> Sentiment;
}

/// HTTP client for the sentiment service
pub struct SentimentClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl SentimentClient {
    /// Create new client; every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SentimentError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SentimentError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SentimentError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SentimentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn analyze_url(&self, text: &str) -> Result<Url, SentimentError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SentimentError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("analyze")
            .push(text);
        Ok(url)
    }

    /// Classify `text`, reporting why when no label could be obtained
    pub async fn try_classify(&self, text: &str) -> Result<Sentiment, SentimentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SentimentError::EmptyText);
        }

        let url = self.analyze_url(text)?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SentimentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SentimentError::Status(status.as_u16()));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Parse(e.to_string()))?;

        let label = body.sentiment.unwrap_or_default();
        Sentiment::parse(&label).ok_or(SentimentError::UnknownLabel(label))
    }
}

#[async_trait]
impl SentimentApi for SentimentClient {
    async fn classify(&self, text: &str) -> Sentiment {
        match self.try_classify(text).await {
            Ok(sentiment) => sentiment,
            Err(SentimentError::EmptyText) => FALLBACK_SENTIMENT,
            Err(e) => {
                tracing::warn!("Sentiment classification failed, using {}: {}", FALLBACK_SENTIMENT.as_str(), e);
                FALLBACK_SENTIMENT
            }
        }
    }
}
