//! # Repository Module
//!
//! Database repository implementations for hisaab.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().record(input)                                      │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── record(&self, input)      ┐                                       │
//! │  ├── update(&self, id, input)  ├── one transaction each, sale row and  │
//! │  └── delete(&self, id)         ┘   stock move commit together          │
//! │       │                                                                 │
//! │       │  item::apply_stock_delta(&mut tx, code, delta, policy)         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory CRUD and stock movement
//! - [`sale::SaleRepository`] - Sale recording and inventory reconciliation
//! - [`invoice::InvoiceRepository`] - GST invoices
//! - [`ledger::CashFlowRepository`] - Cash-flow entries
//! - [`ledger::ProfitLossRepository`] - Monthly profit & loss entries
//! - [`credit::CreditRepository`] - Cash-credit account
//! - [`user::UserRepository`] - Back-office users

pub mod credit;
pub mod invoice;
pub mod item;
pub mod ledger;
pub mod sale;
pub mod user;
