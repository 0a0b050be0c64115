//! Dealer and sentiment clients against stub HTTP services
//!
//! Each test binds an axum stub on an ephemeral local port.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;

use dealership_api::clients::dealer::GENERIC_SUBMIT_FAILURE;
use dealership_api::clients::{
    DealerApi, DealerClient, Lookup, ReviewSubmission, Sentiment, SentimentApi, SentimentClient,
    SubmitOutcome, UpstreamError,
};

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// URL of a port nothing listens on
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn dealer_stub() -> Router {
    Router::new()
        .route("/fetchDealers", get(|| async { Json(json!([])) }))
        .route(
            "/fetchDealers/:state",
            get(|Path(state): Path<String>| async move {
                if state == "New York" {
                    Json(json!([{"id": 3, "state": "New York"}]))
                } else {
                    Json(json!({"error": "unknown state"}))
                }
            }),
        )
        .route(
            "/fetchDealer/:id",
            get(|Path(id): Path<i64>| async move {
                match id {
                    15 => (StatusCode::OK, Json(json!({"id": 15, "short_name": "Sunflower"}))),
                    404 => (StatusCode::NOT_FOUND, Json(json!({"error": "no such dealer"}))),
                    _ => (StatusCode::OK, Json(json!({}))),
                }
            }),
        )
        .route(
            "/fetchReviews/dealer/:id",
            get(|Path(id): Path<i64>| async move {
                if id == 15 {
                    (StatusCode::OK, Json(json!([{"review": "fine"}])))
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db down"})))
                }
            }),
        )
        .route(
            "/insert_review",
            post(|Json(body): Json<Value>| async move {
                match body["review"].as_str() {
                    Some("ok") => (StatusCode::OK, Json(json!({"id": 77, "name": body["name"]}))),
                    Some("mongo") => (StatusCode::OK, Json(json!({"_id": "65f0c2"}))),
                    _ => (StatusCode::BAD_REQUEST, Json(json!({"error": "Dealer closed"}))),
                }
            }),
        )
        .route(
            "/plain400/insert_review",
            post(|| async { (StatusCode::BAD_REQUEST, "review text too long") }),
        )
        .route(
            "/plain503/insert_review",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream maintenance") }),
        )
        .route(
            "/slow/fetchDealers",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!([]))
            }),
        )
}

fn submission(review: &str) -> ReviewSubmission {
    ReviewSubmission {
        id: json!(""),
        name: "Ada Lovelace".to_string(),
        dealership: json!(15),
        review: json!(review),
        purchase: json!(true),
        purchase_date: json!("02/16/2024"),
        car_make: json!("Audi"),
        car_model: json!("A4"),
        car_year: json!(2023),
    }
}

// =============================================================================
// DealerClient
// =============================================================================

#[tokio::test]
async fn test_empty_list_is_found() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(client.list_dealers("All").await.unwrap(), Lookup::Found(Vec::new()));
}

#[tokio::test]
async fn test_region_lookup_and_non_list_body() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&base, Duration::from_secs(2)).unwrap();

    let Lookup::Found(dealers) = client.list_dealers("New York").await.unwrap() else {
        panic!("expected dealers for New York");
    };
    assert_eq!(dealers[0]["id"], 3);

    assert_eq!(client.list_dealers("Atlantis").await.unwrap(), Lookup::NotFound);
}

#[tokio::test]
async fn test_get_dealer_outcomes() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&base, Duration::from_secs(2)).unwrap();

    assert!(matches!(client.get_dealer(15).await.unwrap(), Lookup::Found(d) if d["id"] == 15));
    assert_eq!(client.get_dealer(404).await.unwrap(), Lookup::NotFound);
    // Empty object is falsy
    assert_eq!(client.get_dealer(8).await.unwrap(), Lookup::NotFound);
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(
        client.list_reviews(15).await.unwrap(),
        Lookup::Found(vec![json!({"review": "fine"})])
    );
    match client.list_reviews(16).await {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("db down"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_upstream_error() {
    let client = DealerClient::new(&closed_port_url().await, Duration::from_secs(2)).unwrap();

    assert!(matches!(client.list_dealers("All").await, Err(UpstreamError::Transport(_))));
    assert!(client.submit_review(&submission("ok")).await.is_err());
}

#[tokio::test]
async fn test_timeout_is_upstream_error() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&format!("{}/slow", base), Duration::from_millis(50)).unwrap();

    assert!(matches!(client.list_dealers("All").await, Err(UpstreamError::Timeout(_))));
}

#[tokio::test]
async fn test_submit_review_outcomes() {
    let base = spawn_stub(dealer_stub()).await;
    let client = DealerClient::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(
        client.submit_review(&submission("ok")).await.unwrap(),
        SubmitOutcome::Accepted { review_id: json!(77) }
    );
    assert_eq!(
        client.submit_review(&submission("mongo")).await.unwrap(),
        SubmitOutcome::Accepted { review_id: json!("65f0c2") }
    );
    assert_eq!(
        client.submit_review(&submission("nope")).await.unwrap(),
        SubmitOutcome::Rejected { message: "Dealer closed".to_string() }
    );
}

#[tokio::test]
async fn test_submit_review_plain_text_answers() {
    let base = spawn_stub(dealer_stub()).await;

    let client = DealerClient::new(&format!("{}/plain400", base), Duration::from_secs(2)).unwrap();
    assert_eq!(
        client.submit_review(&submission("ok")).await.unwrap(),
        SubmitOutcome::Rejected { message: GENERIC_SUBMIT_FAILURE.to_string() }
    );

    let client = DealerClient::new(&format!("{}/plain503", base), Duration::from_secs(2)).unwrap();
    match client.submit_review(&submission("ok")).await {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream maintenance");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

// =============================================================================
// SentimentClient
// =============================================================================

fn sentiment_stub() -> Router {
    Router::new().route(
        "/analyze/:text",
        get(|Path(text): Path<String>| async move {
            if text.contains("great") {
                (StatusCode::OK, Json(json!({"sentiment": "positive"})))
            } else if text.contains("awful") {
                (StatusCode::OK, Json(json!({"sentiment": "NEGATIVE"})))
            } else if text.contains("odd") {
                (StatusCode::OK, Json(json!({"sentiment": "mixed"})))
            } else if text.contains("silent") {
                (StatusCode::OK, Json(json!({"label": "positive"})))
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "model offline"})))
            }
        }),
    )
}

#[tokio::test]
async fn test_sentiment_labels() {
    let base = spawn_stub(sentiment_stub()).await;
    let client = SentimentClient::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(client.classify("great cars / friendly staff").await, Sentiment::Positive);
    assert_eq!(client.classify("awful").await, Sentiment::Negative);
}

#[tokio::test]
async fn test_sentiment_falls_back_to_neutral() {
    let base = spawn_stub(sentiment_stub()).await;
    let client = SentimentClient::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(client.classify("odd").await, Sentiment::Neutral);
    assert_eq!(client.classify("silent").await, Sentiment::Neutral);
    assert_eq!(client.classify("anything else").await, Sentiment::Neutral);

    let offline = SentimentClient::new(&closed_port_url().await, Duration::from_secs(2)).unwrap();
    assert_eq!(offline.classify("great").await, Sentiment::Neutral);
}
