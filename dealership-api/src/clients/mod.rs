//! Clients for the remote services behind the gateway

pub mod dealer;
pub mod sentiment;

pub use dealer::{DealerApi, DealerClient, Lookup, ReviewSubmission, SubmitOutcome, UpstreamError};
pub use sentiment::{Sentiment, SentimentApi, SentimentClient, FALLBACK_SENTIMENT};
