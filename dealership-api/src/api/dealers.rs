//! Dealer and review listings proxied from the dealer service

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use super::envelope::Envelope;
use crate::clients::dealer::{Lookup, ALL_REGIONS};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DealerListing {
    pub dealers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DealerDetail {
    pub dealer: Value,
}

#[derive(Debug, Serialize)]
pub struct ReviewListing {
    pub reviews: Vec<Value>,
}

/// Dealer ids arrive as path text; anything but an integer is a bad request
pub(crate) fn parse_dealer_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Invalid dealer id: {}", raw)))
}

/// GET /api/dealers
pub async fn list_dealers(state: State<AppState>) -> ApiResult<Envelope<DealerListing>> {
    dealers_in_region(state, ALL_REGIONS).await
}

/// GET /api/dealers/region/:region
pub async fn list_dealers_by_region(
    state: State<AppState>,
    Path(region): Path<String>,
) -> ApiResult<Envelope<DealerListing>> {
    dealers_in_region(state, &region).await
}

async fn dealers_in_region(
    State(state): State<AppState>,
    region: &str,
) -> ApiResult<Envelope<DealerListing>> {
    match state.dealers.list_dealers(region).await? {
        Lookup::Found(dealers) => Ok(Envelope::ok(DealerListing { dealers })),
        Lookup::NotFound => Err(ApiError::NotFound("No dealerships found".to_string())),
    }
}

/// GET /api/dealer/:dealer_id
pub async fn get_dealer(
    State(state): State<AppState>,
    Path(dealer_id): Path<String>,
) -> ApiResult<Envelope<DealerDetail>> {
    let dealer_id = parse_dealer_id(&dealer_id)?;

    match state.dealers.get_dealer(dealer_id).await? {
        Lookup::Found(dealer) => Ok(Envelope::ok(DealerDetail { dealer })),
        Lookup::NotFound => Err(ApiError::NotFound("Dealer not found".to_string())),
    }
}

/// GET /api/dealer/:dealer_id/reviews
///
/// Each review comes back with a `sentiment` label attached.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(dealer_id): Path<String>,
) -> ApiResult<Envelope<ReviewListing>> {
    let dealer_id = parse_dealer_id(&dealer_id)?;

    match state.dealers.list_reviews(dealer_id).await? {
        Lookup::Found(reviews) => {
            let reviews = state.enricher.enrich(reviews).await;
            Ok(Envelope::ok(ReviewListing { reviews }))
        }
        Lookup::NotFound => Err(ApiError::NotFound("No reviews found".to_string())),
    }
}
