//! Catalog seeding
//!
//! Fills an empty catalog from the embedded, versioned seed dataset. Safe
//! to call on every catalog read: when the store is populated the cost is
//! two `COUNT(*)` queries.
//!
//! Concurrent first access is resolved in two layers. Within the process an
//! async mutex lets one caller seed while the others wait. Across processes
//! (or pools) the insert runs in a `BEGIN IMMEDIATE` transaction: it holds
//! the write lock from the start, so a second seeder waits on the busy
//! timeout and then finds the catalog populated. Any failed attempt re-reads
//! the counts, and a populated store is reported as `AlreadyPopulated`.

use dealership_common::db::catalog;
use dealership_common::db::models::{CarType, NewCarMake, NewCarModel};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

const SEED_CATALOG_V1: &str = include_str!("../seed/catalog_v1.json");

/// Seeding errors
#[derive(Debug, Error)]
pub enum SeedError {
    /// Seed rows violate a uniqueness or validation rule
    #[error("Seed conflict: {0}")]
    Conflict(String),

    /// Seed document could not be parsed
    #[error("Seed dataset invalid: {0}")]
    Dataset(String),

    /// Store failure unrelated to the seed rows
    #[error(transparent)]
    Store(#[from] dealership_common::Error),
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        SeedError::Store(err.into())
    }
}

impl SeedError {
    /// Conflict and validation failures from the store are seed conflicts
    fn from_insert(err: dealership_common::Error) -> Self {
        use dealership_common::Error as E;
        match err {
            E::Conflict(msg) | E::InvalidInput(msg) => SeedError::Conflict(msg),
            other => SeedError::Store(other),
        }
    }
}

/// What `ensure_populated` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadyPopulated,
    Seeded { makes: usize, models: usize },
}

#[derive(Debug, Deserialize)]
struct SeedDataset {
    version: u32,
    makes: Vec<SeedMake>,
}

#[derive(Debug, Deserialize)]
struct SeedMake {
    #[serde(flatten)]
    make: NewCarMake,
    #[serde(default)]
    models: Vec<SeedModel>,
}

#[derive(Debug, Deserialize)]
struct SeedModel {
    name: String,
    #[serde(rename = "type", default)]
    car_type: CarType,
    year: i32,
    dealer_id: i64,
    #[serde(default)]
    engine: String,
    #[serde(default)]
    trim_level: String,
    #[serde(default)]
    mpg_city: Option<i32>,
    #[serde(default)]
    mpg_highway: Option<i32>,
    #[serde(default)]
    base_price: Option<f64>,
    #[serde(default)]
    is_featured: bool,
}

impl SeedModel {
    fn to_new(&self, car_make_id: i64) -> NewCarModel {
        NewCarModel {
            car_make_id,
            dealer_id: self.dealer_id,
            name: self.name.clone(),
            car_type: self.car_type,
            year: self.year,
            engine: self.engine.clone(),
            trim_level: self.trim_level.clone(),
            mpg_city: self.mpg_city,
            mpg_highway: self.mpg_highway,
            base_price: self.base_price,
            is_featured: self.is_featured,
        }
    }
}

/// Idempotent catalog bootstrap
#[derive(Clone)]
pub struct CatalogSeeder {
    pool: SqlitePool,
    dataset: Arc<SeedDataset>,
    guard: Arc<Mutex<()>>,
}

impl CatalogSeeder {
    /// Seeder using the built-in dataset
    pub fn new(pool: SqlitePool) -> Result<Self, SeedError> {
        Self::with_dataset(pool, SEED_CATALOG_V1)
    }

    /// Seeder using a caller-supplied JSON dataset
    pub fn with_dataset(pool: SqlitePool, dataset_json: &str) -> Result<Self, SeedError> {
        let dataset: SeedDataset =
            serde_json::from_str(dataset_json).map_err(|e| SeedError::Dataset(e.to_string()))?;

        Ok(Self {
            pool,
            dataset: Arc::new(dataset),
            guard: Arc::new(Mutex::new(())),
        })
    }

    /// Version of the loaded dataset
    pub fn dataset_version(&self) -> u32 {
        self.dataset.version
    }

    /// Seed the catalog if it has no makes or no models
    pub async fn ensure_populated(&self) -> Result<SeedOutcome, SeedError> {
        if self.is_populated().await? {
            return Ok(SeedOutcome::AlreadyPopulated);
        }

        let _guard = self.guard.lock().await;

        match self.seed().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.is_populated().await? {
                    warn!("Seeding lost a race with another writer ({}); catalog already populated", err);
                    Ok(SeedOutcome::AlreadyPopulated)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn is_populated(&self) -> Result<bool, SeedError> {
        let makes = catalog::count_makes(&self.pool).await?;
        if makes == 0 {
            return Ok(false);
        }
        let models = catalog::count_models(&self.pool).await?;
        Ok(models > 0)
    }

    /// Insert the dataset in one write-locked transaction
    ///
    /// Makes already present (by name) are reused, so a store holding makes
    /// but no models is completed rather than rejected. The counts are read
    /// again under the lock, so a writer that finished first turns this into
    /// a no-op.
    async fn seed(&self) -> Result<SeedOutcome, SeedError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let populated = catalog::count_makes(&mut *tx).await? > 0
            && catalog::count_models(&mut *tx).await? > 0;
        if populated {
            tx.rollback().await?;
            return Ok(SeedOutcome::AlreadyPopulated);
        }

        let mut makes = 0;
        let mut models = 0;

        for seed_make in &self.dataset.makes {
            let make = match catalog::find_make_by_name(&mut *tx, &seed_make.make.name).await? {
                Some(existing) => existing,
                None => {
                    makes += 1;
                    catalog::insert_make(&mut *tx, &seed_make.make)
                        .await
                        .map_err(SeedError::from_insert)?
                }
            };

            for seed_model in &seed_make.models {
                catalog::insert_model(&mut *tx, &seed_model.to_new(make.id))
                    .await
                    .map_err(SeedError::from_insert)?;
                models += 1;
            }
        }

        tx.commit().await?;

        info!(
            version = self.dataset.version,
            makes, models, "Seeded car catalog"
        );
        Ok(SeedOutcome::Seeded { makes, models })
    }
}
