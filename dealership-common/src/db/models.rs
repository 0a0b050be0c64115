//! Catalog and identity records

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Year the first production automobile was built
pub const FIRST_CAR_YEAR: i32 = 1886;

/// Earliest model year accepted in the catalog
pub const MIN_MODEL_YEAR: i32 = 1900;

/// Largest value a `DECIMAL(10, 2)` price can hold
pub const MAX_BASE_PRICE: f64 = 99_999_999.99;

/// Body style of a car model
///
/// Stored by its upper-case code; listed by its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarType {
    Sedan,
    #[default]
    Suv,
    Wagon,
    Coupe,
    Convertible,
    Truck,
    Van,
    Hatchback,
    Electric,
    Hybrid,
}

impl CarType {
    pub const ALL: [CarType; 10] = [
        CarType::Sedan,
        CarType::Suv,
        CarType::Wagon,
        CarType::Coupe,
        CarType::Convertible,
        CarType::Truck,
        CarType::Van,
        CarType::Hatchback,
        CarType::Electric,
        CarType::Hybrid,
    ];

    /// Storage code (e.g. `SEDAN`)
    pub fn code(self) -> &'static str {
        match self {
            CarType::Sedan => "SEDAN",
            CarType::Suv => "SUV",
            CarType::Wagon => "WAGON",
            CarType::Coupe => "COUPE",
            CarType::Convertible => "CONVERTIBLE",
            CarType::Truck => "TRUCK",
            CarType::Van => "VAN",
            CarType::Hatchback => "HATCHBACK",
            CarType::Electric => "ELECTRIC",
            CarType::Hybrid => "HYBRID",
        }
    }

    /// Human-readable label (e.g. `Sedan`)
    pub fn label(self) -> &'static str {
        match self {
            CarType::Sedan => "Sedan",
            CarType::Suv => "SUV",
            CarType::Wagon => "Wagon",
            CarType::Coupe => "Coupe",
            CarType::Convertible => "Convertible",
            CarType::Truck => "Truck",
            CarType::Van => "Van",
            CarType::Hatchback => "Hatchback",
            CarType::Electric => "Electric",
            CarType::Hybrid => "Hybrid",
        }
    }

    /// Parse a storage code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

/// Manufacturer row
#[derive(Debug, Clone, Serialize)]
pub struct CarMake {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub founded_year: Option<i32>,
    pub headquarters: String,
    pub website: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Manufacturer to insert
#[derive(Debug, Clone, Deserialize)]
pub struct NewCarMake {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub headquarters: String,
    #[serde(default)]
    pub website: String,
}

impl NewCarMake {
    /// Check field rules against the current calendar year
    pub fn validate(&self) -> Result<()> {
        self.validate_for_year(Utc::now().year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("make name must not be empty".to_string()));
        }
        if self.name.chars().count() > 100 {
            return Err(Error::InvalidInput(format!(
                "make name {:?} exceeds 100 characters",
                self.name
            )));
        }
        if let Some(year) = self.founded_year {
            if !(FIRST_CAR_YEAR..=current_year).contains(&year) {
                return Err(Error::InvalidInput(format!(
                    "founded_year {} outside [{}, {}]",
                    year, FIRST_CAR_YEAR, current_year
                )));
            }
        }
        if self.headquarters.chars().count() > 100 {
            return Err(Error::InvalidInput(
                "headquarters exceeds 100 characters".to_string(),
            ));
        }
        if !self.website.is_empty()
            && !(self.website.starts_with("http://") || self.website.starts_with("https://"))
        {
            return Err(Error::InvalidInput(format!(
                "website {:?} is not an http(s) URL",
                self.website
            )));
        }
        Ok(())
    }
}

/// Vehicle line row, scoped to a model year
#[derive(Debug, Clone, Serialize)]
pub struct CarModel {
    pub id: i64,
    pub car_make_id: i64,
    pub dealer_id: i64,
    pub name: String,
    pub car_type: CarType,
    pub year: i32,
    pub engine: String,
    pub trim_level: String,
    pub mpg_city: Option<i32>,
    pub mpg_highway: Option<i32>,
    pub base_price: Option<f64>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vehicle line to insert
#[derive(Debug, Clone)]
pub struct NewCarModel {
    pub car_make_id: i64,
    pub dealer_id: i64,
    pub name: String,
    pub car_type: CarType,
    pub year: i32,
    pub engine: String,
    pub trim_level: String,
    pub mpg_city: Option<i32>,
    pub mpg_highway: Option<i32>,
    pub base_price: Option<f64>,
    pub is_featured: bool,
}

impl NewCarModel {
    /// Minimal model with every optional descriptor left empty
    pub fn new(car_make_id: i64, dealer_id: i64, name: &str, car_type: CarType, year: i32) -> Self {
        Self {
            car_make_id,
            dealer_id,
            name: name.to_string(),
            car_type,
            year,
            engine: String::new(),
            trim_level: String::new(),
            mpg_city: None,
            mpg_highway: None,
            base_price: None,
            is_featured: false,
        }
    }

    /// Check field rules against the current calendar year
    pub fn validate(&self) -> Result<()> {
        self.validate_for_year(Utc::now().year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("model name must not be empty".to_string()));
        }
        if self.dealer_id < 1 {
            return Err(Error::InvalidInput(format!(
                "dealer_id must be positive, got {}",
                self.dealer_id
            )));
        }
        let max_year = current_year + 1;
        if !(MIN_MODEL_YEAR..=max_year).contains(&self.year) {
            return Err(Error::InvalidInput(format!(
                "year {} outside [{}, {}]",
                self.year, MIN_MODEL_YEAR, max_year
            )));
        }
        if self.engine.chars().count() > 50 || self.trim_level.chars().count() > 50 {
            return Err(Error::InvalidInput(
                "engine and trim_level are limited to 50 characters".to_string(),
            ));
        }
        for (field, value) in [("mpg_city", self.mpg_city), ("mpg_highway", self.mpg_highway)] {
            if matches!(value, Some(v) if v < 0) {
                return Err(Error::InvalidInput(format!("{} must be non-negative", field)));
            }
        }
        if let Some(price) = self.base_price {
            if !(0.0..=MAX_BASE_PRICE).contains(&price) {
                return Err(Error::InvalidInput(format!(
                    "base_price {} outside [0, {}]",
                    price, MAX_BASE_PRICE
                )));
            }
        }
        Ok(())
    }
}

/// A model joined with the name of its make
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub make_name: String,
    pub model_name: String,
    pub year: i32,
    pub car_type: CarType,
    pub dealer_id: i64,
}
