//! Local car catalog listing

use axum::extract::State;
use dealership_common::db::catalog;
use dealership_common::db::models::CatalogEntry;
use serde::Serialize;

use super::envelope::Envelope;
use crate::error::ApiResult;
use crate::AppState;

/// One model with its make, as listed to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogCar {
    pub car_model: String,
    pub car_make: String,
    pub year: i32,
    /// Human-readable body style, e.g. "Sedan"
    #[serde(rename = "Type")]
    pub car_type: &'static str,
    pub dealer_id: i64,
}

impl From<CatalogEntry> for CatalogCar {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            car_model: entry.model_name,
            car_make: entry.make_name,
            year: entry.year,
            car_type: entry.car_type.label(),
            dealer_id: entry.dealer_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogListing {
    #[serde(rename = "CarModels")]
    pub car_models: Vec<CatalogCar>,
}

/// GET /api/cars
///
/// Seeds an empty catalog before reading it.
pub async fn list_cars(State(state): State<AppState>) -> ApiResult<Envelope<CatalogListing>> {
    state.seeder.ensure_populated().await?;

    let entries = catalog::list_models_with_makes(&state.db).await?;
    tracing::debug!(models = entries.len(), "Listing catalog");

    Ok(Envelope::ok(CatalogListing {
        car_models: entries.into_iter().map(CatalogCar::from).collect(),
    }))
}
