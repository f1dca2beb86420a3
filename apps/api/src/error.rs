//! # API Error Type
//!
//! Every handler returns `Result<_, ApiError>`. The error carries its HTTP
//! status and renders as `{code, error, details?}`.
//!
//! ## Status Mapping
//! ```text
//! ┌──────────────────────────────────────────┬────────┬──────────────────┐
//! │ Source                                   │ Status │ code             │
//! ├──────────────────────────────────────────┼────────┼──────────────────┤
//! │ ValidationError, malformed JSON          │  400   │ VALIDATION_ERROR │
//! │ DuplicateItem (company/category/sub-cat) │  400   │ DUPLICATE_ITEM   │
//! │ missing / bad bearer token               │  401   │ UNAUTHORIZED     │
//! │ NotFound, ItemNotFound, SaleNotFound     │  404   │ NOT_FOUND        │
//! │ InsufficientStock, UniqueViolation       │  409   │ CONFLICT         │
//! │ anything else from the database          │  500   │ DATABASE_ERROR   │
//! └──────────────────────────────────────────┴────────┴──────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use hisaab_core::{CoreError, ValidationError};
use hisaab_db::DbError;

/// API errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", error)
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", error)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Replaces the headline with `headline`, keeping the status and moving
    /// the original message into `details`.
    ///
    /// ## Example
    /// ```text
    /// 404 "Item not found in inventory: X9"
    ///   .context("Failed to save sales entry.")
    /// 404 { error: "Failed to save sales entry.",
    ///       details: "Item not found in inventory: X9" }
    /// ```
    pub fn context(mut self, headline: impl Into<String>) -> Self {
        let original = std::mem::replace(&mut self.error, headline.into());
        if self.details.is_none() {
            self.details = Some(original);
        }
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "code": self.code,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }

        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            CoreError::ItemNotFound(_) | CoreError::SaleNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            CoreError::InsufficientStock { .. } => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", err.to_string())
            }
            CoreError::DuplicateItem { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "DUPLICATE_ITEM", "Item already exists")
                    .with_details(err.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", err.to_string())
            }
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error",
                )
                .with_details(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query parameters").with_details(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
