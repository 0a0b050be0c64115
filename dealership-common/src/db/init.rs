//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates the catalog and
//! identity tables. Table creation is idempotent, so this runs on every
//! startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets the listing handlers read while the seeder writes
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool holds exactly one connection that is never recycled, since
/// every SQLite `:memory:` connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_car_makes_table(pool).await?;
    create_car_models_table(pool).await?;
    create_users_table(pool).await?;
    Ok(())
}

/// Create the car_makes table
pub async fn create_car_makes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS car_makes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
            description TEXT NOT NULL DEFAULT '',
            founded_year INTEGER CHECK (founded_year IS NULL OR founded_year >= 1886),
            headquarters TEXT NOT NULL DEFAULT '',
            website TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the car_models table
///
/// Deleting a make cascades to its models. A make may list a given
/// model name only once per model year.
pub async fn create_car_models_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS car_models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            car_make_id INTEGER NOT NULL REFERENCES car_makes(id) ON DELETE CASCADE,
            dealer_id INTEGER NOT NULL CHECK (dealer_id >= 1),
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            type TEXT NOT NULL DEFAULT 'SUV',
            year INTEGER NOT NULL CHECK (year >= 1900),
            engine TEXT NOT NULL DEFAULT '',
            trim_level TEXT NOT NULL DEFAULT '',
            mpg_city INTEGER CHECK (mpg_city IS NULL OR mpg_city >= 0),
            mpg_highway INTEGER CHECK (mpg_highway IS NULL OR mpg_highway >= 0),
            base_price REAL CHECK (base_price IS NULL OR base_price >= 0),
            is_featured INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            CONSTRAINT unique_model_year UNIQUE (car_make_id, name, year)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_car_models_make ON car_models(car_make_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
