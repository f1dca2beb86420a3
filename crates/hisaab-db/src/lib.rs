//! # hisaab-db: Database Layer for hisaab
//!
//! All SQLite access for hisaab, through sqlx. This crate owns every
//! transaction, including the one that keeps the sales ledger and the
//! inventory stock counts in step.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         hisaab Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hisaab-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ItemRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo ★    │    │ 001_init.sql │  │   │
//! │  │   │ StockPolicy   │    │ InvoiceRepo   │    │              │  │   │
//! │  │   │               │    │ Ledgers/Users │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite database (WAL mode)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hisaab_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("hisaab.db")).await?;
//!
//! let recorded = db.sales().record(input).await?;
//! let stock = db.items().find_by_code(&recorded.sale.code).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::CreditRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::item::ItemRepository;
pub use repository::ledger::{CashFlowRepository, ProfitLossRepository};
pub use repository::sale::{DeletedSale, RecordedSale, SaleRepository, UpdatedSale};
pub use repository::user::{UserCredentials, UserRepository};
