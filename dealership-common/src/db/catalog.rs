//! Catalog store: car makes and their models
//!
//! Write functions accept any SQLite executor so the seeder can run them
//! inside a transaction. Range rules are checked in Rust before the insert;
//! uniqueness is left to the table constraints and surfaces as
//! [`Error::Conflict`].

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use super::models::{CarMake, CarModel, CarType, CatalogEntry, NewCarMake, NewCarModel};
use crate::{Error, Result};

/// Number of makes in the store
pub async fn count_makes<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM car_makes")
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Number of models in the store
pub async fn count_models<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM car_models")
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Insert a make
///
/// Returns `Conflict` when a make with the same name exists.
pub async fn insert_make<'e, E>(executor: E, make: &NewCarMake) -> Result<CarMake>
where
    E: Executor<'e, Database = Sqlite>,
{
    make.validate()?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO car_makes (name, description, founded_year, headquarters, website, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&make.name)
    .bind(&make.description)
    .bind(make.founded_year)
    .bind(&make.headquarters)
    .bind(&make.website)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await
    .map_err(|e| Error::from_write(e, &format!("car make {:?}", make.name)))?;

    Ok(CarMake {
        id: result.last_insert_rowid(),
        name: make.name.clone(),
        description: make.description.clone(),
        founded_year: make.founded_year,
        headquarters: make.headquarters.clone(),
        website: make.website.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Insert a model
///
/// Returns `Conflict` when the make already lists this name for this year.
pub async fn insert_model<'e, E>(executor: E, model: &NewCarModel) -> Result<CarModel>
where
    E: Executor<'e, Database = Sqlite>,
{
    model.validate()?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO car_models (
            car_make_id, dealer_id, name, type, year, engine, trim_level,
            mpg_city, mpg_highway, base_price, is_featured, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(model.car_make_id)
    .bind(model.dealer_id)
    .bind(&model.name)
    .bind(model.car_type.code())
    .bind(model.year)
    .bind(&model.engine)
    .bind(&model.trim_level)
    .bind(model.mpg_city)
    .bind(model.mpg_highway)
    .bind(model.base_price)
    .bind(model.is_featured)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await
    .map_err(|e| Error::from_write(e, &format!("car model {:?} ({})", model.name, model.year)))?;

    Ok(CarModel {
        id: result.last_insert_rowid(),
        car_make_id: model.car_make_id,
        dealer_id: model.dealer_id,
        name: model.name.clone(),
        car_type: model.car_type,
        year: model.year,
        engine: model.engine.clone(),
        trim_level: model.trim_level.clone(),
        mpg_city: model.mpg_city,
        mpg_highway: model.mpg_highway,
        base_price: model.base_price,
        is_featured: model.is_featured,
        created_at: now,
        updated_at: now,
    })
}

/// Look up a make by its unique name
pub async fn find_make_by_name<'e, E>(executor: E, name: &str) -> Result<Option<CarMake>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, name, description, founded_year, headquarters, website, created_at, updated_at
        FROM car_makes
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    row.map(|r| make_from_row(&r)).transpose()
}

/// Every model joined with its make
///
/// Ordered by make name, then model name, then year (newest first).
pub async fn list_models_with_makes(pool: &SqlitePool) -> Result<Vec<CatalogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT mk.name AS make_name, m.name AS model_name, m.year, m.type, m.dealer_id
        FROM car_models m
        JOIN car_makes mk ON mk.id = m.car_make_id
        ORDER BY mk.name ASC, m.name ASC, m.year DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<CatalogEntry> {
            Ok(CatalogEntry {
                make_name: row.try_get("make_name")?,
                model_name: row.try_get("model_name")?,
                year: row.try_get("year")?,
                car_type: car_type_from_row(row)?,
                dealer_id: row.try_get("dealer_id")?,
            })
        })
        .collect()
}

/// Delete a make together with its models
///
/// Returns `NotFound` when no make has this id.
pub async fn delete_make(pool: &SqlitePool, car_make_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM car_makes WHERE id = ?")
        .bind(car_make_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("car make {}", car_make_id)));
    }
    Ok(())
}

fn car_type_from_row(row: &SqliteRow) -> Result<CarType> {
    let code: String = row.try_get("type")?;
    CarType::from_code(&code)
        .ok_or_else(|| Error::Internal(format!("unknown car type code {:?} in store", code)))
}

fn make_from_row(row: &SqliteRow) -> Result<CarMake> {
    Ok(CarMake {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        founded_year: row.try_get("founded_year")?,
        headquarters: row.try_get("headquarters")?,
        website: row.try_get("website")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    fn nissan() -> NewCarMake {
        NewCarMake {
            name: "NISSAN".to_string(),
            description: "Great cars. Japanese technology".to_string(),
            founded_year: Some(1933),
            headquarters: "Yokohama".to_string(),
            website: "https://www.nissan-global.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_counts_start_at_zero() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(count_makes(&pool).await.unwrap(), 0);
        assert_eq!(count_models(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_make_name_conflicts() {
        let pool = init_memory_database().await.unwrap();
        insert_make(&pool, &nissan()).await.unwrap();

        let err = insert_make(&pool, &nissan()).await.unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {:?}", err);
        assert_eq!(count_makes(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_model_year_conflicts() {
        let pool = init_memory_database().await.unwrap();
        let make = insert_make(&pool, &nissan()).await.unwrap();

        let model = NewCarModel::new(make.id, 3, "Pathfinder", CarType::Suv, 2023);
        insert_model(&pool, &model).await.unwrap();

        let err = insert_model(&pool, &model).await.unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {:?}", err);

        // Same name, different year is a distinct record
        let next_year = NewCarModel::new(make.id, 3, "Pathfinder", CarType::Suv, 2024);
        insert_model(&pool, &next_year).await.unwrap();
        assert_eq!(count_models(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_model_requires_existing_make() {
        let pool = init_memory_database().await.unwrap();
        let orphan = NewCarModel::new(42, 3, "Ghost", CarType::Sedan, 2020);

        let err = insert_model(&pool, &orphan).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_listing_order_and_labels() {
        let pool = init_memory_database().await.unwrap();
        let nissan = insert_make(&pool, &nissan()).await.unwrap();
        let audi = insert_make(
            &pool,
            &NewCarMake {
                name: "Audi".to_string(),
                description: "German engineering".to_string(),
                founded_year: Some(1909),
                headquarters: String::new(),
                website: String::new(),
            },
        )
        .await
        .unwrap();

        insert_model(&pool, &NewCarModel::new(nissan.id, 1, "Qashqai", CarType::Suv, 2022))
            .await
            .unwrap();
        insert_model(&pool, &NewCarModel::new(audi.id, 2, "A4", CarType::Sedan, 2022))
            .await
            .unwrap();
        insert_model(&pool, &NewCarModel::new(audi.id, 2, "A4", CarType::Sedan, 2024))
            .await
            .unwrap();

        let entries = list_models_with_makes(&pool).await.unwrap();
        let keys: Vec<(&str, &str, i32)> = entries
            .iter()
            .map(|e| (e.make_name.as_str(), e.model_name.as_str(), e.year))
            .collect();

        assert_eq!(
            keys,
            vec![("Audi", "A4", 2024), ("Audi", "A4", 2022), ("NISSAN", "Qashqai", 2022)]
        );
        assert_eq!(entries[2].car_type.label(), "SUV");
    }

    #[tokio::test]
    async fn test_find_make_by_name() {
        let pool = init_memory_database().await.unwrap();
        let inserted = insert_make(&pool, &nissan()).await.unwrap();

        let found = find_make_by_name(&pool, "NISSAN").await.unwrap().unwrap();
        assert_eq!(found.id, inserted.id);
        assert_eq!(found.founded_year, Some(1933));
        assert!(find_make_by_name(&pool, "Tesla").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_make_cascades() {
        let pool = init_memory_database().await.unwrap();
        let make = insert_make(&pool, &nissan()).await.unwrap();
        insert_model(&pool, &NewCarModel::new(make.id, 1, "Leaf", CarType::Electric, 2023))
            .await
            .unwrap();
        assert_eq!(count_models(&pool).await.unwrap(), 1);

        delete_make(&pool, make.id).await.unwrap();

        assert_eq!(count_makes(&pool).await.unwrap(), 0);
        assert_eq!(count_models(&pool).await.unwrap(), 0);
        assert!(matches!(
            delete_make(&pool, make.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
