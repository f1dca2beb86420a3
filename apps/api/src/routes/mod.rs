//! Route handlers, one module per area of the back office.
//!
//! Each module exposes `router()` returning a `Router<SharedState>` that
//! [`crate::build_router`] merges behind the auth layer. Public handlers
//! (login, register, health) are routed individually.

pub mod cash_flow;
pub mod credit;
pub mod gst;
pub mod health;
pub mod items;
pub mod profit_loss;
pub mod sales;
pub mod users;
