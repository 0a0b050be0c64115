//! Identity store: user principals and password verification
//!
//! Passwords are stored as hex SHA-256 of `salt || password` next to a
//! random per-user salt. Plain-text passwords never reach the table.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::{Error, Result};

/// Authenticated identity as seen by request handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Principal {
    /// "First Last", or the username when no names were given
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Registration details
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Create a principal
///
/// Returns `Conflict` when the username is taken.
pub async fn create_principal(
    pool: &SqlitePool,
    new: &NewPrincipal,
    password: &str,
) -> Result<Principal> {
    if new.username.trim().is_empty() {
        return Err(Error::InvalidInput("username must not be empty".to_string()));
    }

    let salt = generate_salt();
    let hash = hash_password(&salt, password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.username)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&hash)
    .bind(&salt)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| Error::from_write(e, &format!("user {:?}", new.username)))?;

    tracing::debug!(username = %new.username, "Created principal");

    Ok(Principal {
        id: result.last_insert_rowid(),
        username: new.username.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        email: new.email.clone(),
    })
}

/// Verify credentials
///
/// Returns `None` for an unknown username or a wrong password alike.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<Principal>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, first_name, last_name, email, password_hash, password_salt
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let stored_hash: String = row.try_get("password_hash")?;
    let salt: String = row.try_get("password_salt")?;

    if constant_time_eq(hash_password(&salt, password).as_bytes(), stored_hash.as_bytes()) {
        Ok(Some(principal_from_row(&row)?))
    } else {
        Ok(None)
    }
}

fn principal_from_row(row: &SqliteRow) -> Result<Principal> {
    Ok(Principal {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
    })
}

fn generate_salt() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    fn alice() -> NewPrincipal {
        NewPrincipal {
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let pool = init_memory_database().await.unwrap();
        let created = create_principal(&pool, &alice(), "rabbit-hole").await.unwrap();

        let found = authenticate(&pool, "alice", "rabbit-hole").await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let pool = init_memory_database().await.unwrap();
        create_principal(&pool, &alice(), "rabbit-hole").await.unwrap();

        assert!(authenticate(&pool, "alice", "looking-glass").await.unwrap().is_none());
        assert!(authenticate(&pool, "bob", "rabbit-hole").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_taken() {
        let pool = init_memory_database().await.unwrap();
        create_principal(&pool, &alice(), "one").await.unwrap();

        let err = create_principal(&pool, &alice(), "two").await.unwrap_err();
        assert!(err.is_conflict(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_password_not_stored_in_clear() {
        let pool = init_memory_database().await.unwrap();
        create_principal(&pool, &alice(), "rabbit-hole").await.unwrap();

        let (hash, salt): (String, String) =
            sqlx::query_as("SELECT password_hash, password_salt FROM users WHERE username = 'alice'")
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_ne!(hash, "rabbit-hole");
        assert_eq!(hash, hash_password(&salt, "rabbit-hole"));
        assert_eq!(hash.len(), 64);
        assert_eq!(salt.len(), 32);
        assert!(hash.chars().chain(salt.chars()).all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_password_known_digest() {
        // SHA-256 of the empty string
        assert_eq!(
            hash_password("", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut principal = Principal {
            id: 1,
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            email: String::new(),
        };
        assert_eq!(principal.display_name(), "Alice Liddell");

        principal.first_name.clear();
        principal.last_name.clear();
        assert_eq!(principal.display_name(), "alice");
    }
}
