//! # hisaab API
//!
//! HTTP + JSON server for the hisaab back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Routes                                    │
//! │                                                                         │
//! │  ┌────────────────────┐  ┌────────────────────┐  ┌──────────────────┐  │
//! │  │  sales             │  │  items             │  │  gst invoice     │  │
//! │  │ • GET/POST /sales  │  │ • GET/POST /items  │  │ • POST           │  │
//! │  │ • GET/PUT/DELETE   │  │ • PUT/DELETE       │  │ • GET {id}       │  │
//! │  │   /sales/{id}      │  │   /items/{id}      │  │ • GET items/{c}  │  │
//! │  └────────────────────┘  └────────────────────┘  └──────────────────┘  │
//! │                                                                         │
//! │  ┌────────────────────┐  ┌────────────────────┐  ┌──────────────────┐  │
//! │  │  cashflow          │  │  cash credit       │  │  users           │  │
//! │  │  profit-loss       │  │ • transactions     │  │ • register/login │  │
//! │  │                    │  │ • calculations     │  │ • list / update  │  │
//! │  │                    │  │ • account-limit    │  │                  │  │
//! │  └────────────────────┘  └────────────────────┘  └──────────────────┘  │
//! │                                                                         │
//! │  Layers (outermost first): request log ─► CORS ─► JWT (protected only) │
//! │  Public: /api/register, /api/login, /api/events, /health               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`] for the environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

// Re-exports
pub use auth::{Claims, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use events::EventBus;

use hisaab_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub events: EventBus,
}

/// Handle passed to every handler and middleware.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> SharedState {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        Arc::new(AppState {
            db,
            config,
            jwt,
            events: EventBus::new(),
        })
    }
}

/// Builds the full router with every layer applied.
pub fn build_router(state: SharedState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/register", post(routes::users::register))
        .route("/api/login", post(routes::users::login))
        .route("/api/events", get(events::stream_events));

    let protected = Router::new()
        .merge(routes::sales::router())
        .merge(routes::gst::router())
        .merge(routes::items::router())
        .merge(routes::cash_flow::router())
        .merge(routes::profit_loss::router())
        .merge(routes::credit::router())
        .merge(routes::users::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors,
        ))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}
