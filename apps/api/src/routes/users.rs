//! # User Routes
//!
//! Registration and login are public; listing and editing users need a
//! token. Passwords are hashed with argon2 before they reach the database
//! and are never returned.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hisaab_core::validation::validate_password;
use hisaab_core::User;
use hisaab_db::DbError;

use crate::auth::{hash_password_blocking, verify_password_blocking, Claims};
use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Protected user routes. Register and login are mounted separately.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", put(update_user))
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// New password; blank keeps the current one.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub old_password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/register`
pub async fn register(
    State(state): State<SharedState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(request) = payload?;
    validate_password(&request.password)?;

    let hash = hash_password_blocking(request.password).await?;
    let user = state
        .db
        .users()
        .create(&request.username, request.email.as_deref(), &hash)
        .await
        .map_err(username_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    let invalid = || ApiError::bad_request("Invalid username or password");

    let creds = state
        .db
        .users()
        .find_credentials(&request.username)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to log in"))?
        .ok_or_else(invalid)?;

    if !verify_password_blocking(request.password, creds.password_hash).await? {
        warn!(username = %creds.username, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = state.jwt.generate_token(creds.id, &creds.username)?;
    info!(user_id = creds.id, username = %creds.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_name: creds.username,
    }))
}

async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .db
        .users()
        .list()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch users"))?;

    Ok(Json(users))
}

/// `PUT /api/users/{id}`: the current password must always be given.
async fn update_user(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(request) = payload?;

    let creds = state
        .db
        .users()
        .find_credentials_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password_blocking(request.old_password, creds.password_hash).await? {
        return Err(ApiError::bad_request("Old password is incorrect"));
    }

    let new_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password_blocking(password).await?)
        }
        None => None,
    };

    let user = state
        .db
        .users()
        .update(id, &request.username, request.email.as_deref(), new_hash.as_deref())
        .await
        .map_err(username_error)?;

    info!(user_id = id, by = %claims.username, "User profile changed");
    Ok(Json(user))
}

fn username_error(err: DbError) -> ApiError {
    match err {
        DbError::UniqueViolation { .. } => ApiError::bad_request("Username already exists"),
        other => other.into(),
    }
}
