//! Review enrichment
//!
//! Attaches a `sentiment` label to every review record returned by the
//! dealer service. One record out per record in, same order. Records whose
//! `review` text is absent or blank get the fallback label without a call
//! to the classifier. Non-object records pass through untouched.

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::clients::sentiment::{SentimentApi, FALLBACK_SENTIMENT};

/// Field holding the review body
pub const REVIEW_FIELD: &str = "review";

/// Field the enricher writes
pub const SENTIMENT_FIELD: &str = "sentiment";

/// Adds sentiment labels to review records
pub struct ReviewEnricher {
    classifier: Arc<dyn SentimentApi>,
    concurrency: usize,
}

impl ReviewEnricher {
    /// `concurrency` bounds the classifier calls in flight for one listing
    pub fn new(classifier: Arc<dyn SentimentApi>, concurrency: usize) -> Self {
        Self {
            classifier,
            concurrency: concurrency.max(1),
        }
    }

    /// Enrich every record, preserving order
    pub async fn enrich(&self, reviews: Vec<Value>) -> Vec<Value> {
        let total = reviews.len();

        // `buffered` yields results in input order regardless of completion order
        let enriched: Vec<Value> = stream::iter(reviews)
            .map(|review| self.enrich_one(review))
            .buffered(self.concurrency)
            .collect()
            .await;

        tracing::debug!(reviews = total, "Enriched reviews with sentiment");
        enriched
    }

    async fn enrich_one(&self, mut review: Value) -> Value {
        let Some(record) = review.as_object_mut() else {
            tracing::debug!("Skipping non-object review record");
            return review;
        };

        let label = match review_text(record) {
            Some(text) => self.classifier.classify(&text).await,
            None => FALLBACK_SENTIMENT,
        };

        record.insert(SENTIMENT_FIELD.to_string(), Value::from(label.as_str()));
        review
    }
}

fn review_text(record: &Map<String, Value>) -> Option<String> {
    record
        .get(REVIEW_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
