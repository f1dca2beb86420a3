//! # User Repository
//!
//! Back-office logins. Passwords arrive here already hashed; this module
//! never sees plaintext.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use hisaab_core::validation::validate_username;
use hisaab_core::User;

const USER_COLUMNS: &str = "id, username, email, created_at";

/// A user together with the stored password hash, for login checks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub password_hash: String,
}

impl UserCredentials {
    /// Drops the hash.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");

        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Creates a user.
    ///
    /// ## Errors
    /// `UniqueViolation { field: "username" }` when the name is taken.
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> DbResult<User> {
        validate_username(username)?;
        let username = username.trim();

        let sql = format!(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email.map(str::trim).filter(|e| !e.is_empty()))
            .bind(password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| username_taken(e.into(), username))?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Looks up a user and hash by name, for login.
    pub async fn find_credentials(&self, username: &str) -> DbResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, email, created_at, password_hash FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    /// Looks up a user and hash by id, for password changes.
    pub async fn find_credentials_by_id(&self, id: i64) -> DbResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, email, created_at, password_hash FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    /// Updates name and email, and the hash when `password_hash` is given.
    pub async fn update(
        &self,
        id: i64,
        username: &str,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> DbResult<User> {
        validate_username(username)?;
        let username = username.trim();

        let sql = format!(
            "UPDATE users
             SET username = ?2, email = ?3, password_hash = COALESCE(?4, password_hash)
             WHERE id = ?1
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(username)
            .bind(email.map(str::trim).filter(|e| !e.is_empty()))
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| username_taken(e.into(), username))?
            .ok_or_else(|| DbError::not_found("User", id))?;

        info!(user_id = id, password_changed = password_hash.is_some(), "User updated");
        Ok(user)
    }
}

fn username_taken(err: DbError, username: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    }
}
