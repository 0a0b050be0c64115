//! Dealer/review service client
//!
//! Wraps the external dealer service's GET and POST endpoints. Each call
//! resolves to one of three outcomes: a payload (possibly an empty list),
//! "not found", or an [`UpstreamError`]. Transport faults never escape as
//! anything other than `UpstreamError`.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("dealership-api/", env!("CARGO_PKG_VERSION"));

/// Region sentinel selecting every dealer
pub const ALL_REGIONS: &str = "All";

/// Message used when the dealer service refuses a review without saying why
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to add review";

/// Dealer service client errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, reset, ...
    #[error("Dealer service unreachable: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("Dealer service timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status other than 404
    #[error("Dealer service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the JSON we expected
    #[error("Malformed response from dealer service: {0}")]
    Malformed(String),

    /// Base URL could not be used to build a request
    #[error("Invalid dealer service URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Result of a read against the dealer service
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Result of a review submission the service answered
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Review stored under the identifier the service assigned
    Accepted { review_id: Value },
    /// Service refused the review
    Rejected { message: String },
}

/// Review creation payload forwarded to the dealer service
///
/// Optional fields the caller left out are sent as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    pub id: Value,
    pub name: String,
    pub dealership: Value,
    pub review: Value,
    pub purchase: Value,
    pub purchase_date: Value,
    pub car_make: Value,
    pub car_model: Value,
    pub car_year: Value,
}

/// Operations the request handlers need from the dealer service
#[async_trait]
pub trait DealerApi: Send + Sync {
    /// Dealers in `region`, or every dealer for [`ALL_REGIONS`]
    async fn list_dealers(&self, region: &str) -> Result<Lookup<Vec<Value>>, UpstreamError>;

    /// One dealer by id
    async fn get_dealer(&self, dealer_id: i64) -> Result<Lookup<Value>, UpstreamError>;

    /// Reviews left for one dealer
    async fn list_reviews(&self, dealer_id: i64) -> Result<Lookup<Vec<Value>>, UpstreamError>;

    /// Create a review
    async fn submit_review(&self, review: &ReviewSubmission)
        -> Result<SubmitOutcome, UpstreamError>;
}

/// HTTP client for the dealer service
pub struct DealerClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl DealerClient {
    /// Create new client; every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::from_reqwest)?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Append path segments to the base URL, percent-encoding each
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document; `None` when the service answers 404
    async fn get_json(&self, segments: &[&str]) -> Result<Option<Value>, UpstreamError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(url = %url, "Querying dealer service");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        Ok(Some(value))
    }

    /// GET a document that must be a JSON array to count as found
    async fn get_sequence(&self, segments: &[&str]) -> Result<Lookup<Vec<Value>>, UpstreamError> {
        match self.get_json(segments).await? {
            Some(Value::Array(items)) => Ok(Lookup::Found(items)),
            Some(other) => {
                tracing::debug!(kind = json_kind(&other), "Dealer service returned a non-list body");
                Ok(Lookup::NotFound)
            }
            None => Ok(Lookup::NotFound),
        }
    }
}

#[async_trait]
impl DealerApi for DealerClient {
    async fn list_dealers(&self, region: &str) -> Result<Lookup<Vec<Value>>, UpstreamError> {
        let result = if region == ALL_REGIONS {
            self.get_sequence(&["fetchDealers"]).await
        } else {
            self.get_sequence(&["fetchDealers", region]).await
        };

        if let Ok(Lookup::Found(ref dealers)) = result {
            tracing::info!(region = %region, dealers = dealers.len(), "Fetched dealers");
        }
        result
    }

    async fn get_dealer(&self, dealer_id: i64) -> Result<Lookup<Value>, UpstreamError> {
        let id = dealer_id.to_string();
        match self.get_json(&["fetchDealer", &id]).await? {
            Some(dealer) if !is_falsy(&dealer) => Ok(Lookup::Found(dealer)),
            _ => Ok(Lookup::NotFound),
        }
    }

    async fn list_reviews(&self, dealer_id: i64) -> Result<Lookup<Vec<Value>>, UpstreamError> {
        let id = dealer_id.to_string();
        self.get_sequence(&["fetchReviews", "dealer", &id]).await
    }

    async fn submit_review(
        &self,
        review: &ReviewSubmission,
    ) -> Result<SubmitOutcome, UpstreamError> {
        let url = self.endpoint(&["insert_review"])?;
        tracing::debug!(url = %url, dealership = %review.dealership, "Submitting review");

        let response = self
            .http_client
            .post(url)
            .json(review)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(UpstreamError::from_reqwest)?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => Ok(submit_outcome(&body)),
            Err(_) if status.is_server_error() => Err(UpstreamError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(_) => Ok(SubmitOutcome::Rejected {
                message: GENERIC_SUBMIT_FAILURE.to_string(),
            }),
        }
    }
}

/// Interpret the dealer service's answer to a review submission
///
/// Success is the presence of an assigned identifier (`id`, else `_id`).
fn submit_outcome(body: &Value) -> SubmitOutcome {
    let review_id = ["id", "_id"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find(|value| !is_falsy(value));

    if let Some(review_id) = review_id {
        return SubmitOutcome::Accepted {
            review_id: review_id.clone(),
        };
    }

    let message = ["error", "message"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.is_empty())
        .unwrap_or(GENERIC_SUBMIT_FAILURE);

    SubmitOutcome::Rejected {
        message: message.to_string(),
    }
}

/// Falsy JSON: null, false, 0, "", [] and {}
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
