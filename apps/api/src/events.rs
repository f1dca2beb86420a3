//! # Server-Sent Events
//!
//! Pushes inventory changes to every open browser tab so stock figures stay
//! current without polling.
//!
//! ```text
//! ┌──────────────┐  publish   ┌───────────────────────┐   data: {...}   ┌─────────┐
//! │ item / sale  │ ─────────► │ broadcast::Sender     │ ──────────────► │ tab #1  │
//! │ handlers     │            │ (capacity 256)        │ ──────────────► │ tab #2  │
//! └──────────────┘            └───────────────────────┘                 └─────────┘
//! ```
//!
//! A client that falls more than 256 events behind skips the ones it missed
//! and keeps streaming.
//!
//! The stream is public (browsers' `EventSource` cannot send a bearer
//! token), so an event names the item and its stock, nothing more. Tabs
//! refetch `/api/items` for prices.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use hisaab_core::InventoryItem;

use crate::SharedState;

/// Buffered events per subscriber.
const CHANNEL_CAPACITY: usize = 256;

/// One event as sent on the wire: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Value,
}

/// What happened to an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAction {
    Add,
    Update,
    Delete,
    /// Quantity moved by a sale being recorded, edited or deleted.
    Stock,
}

impl InventoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryAction::Add => "add",
            InventoryAction::Update => "update",
            InventoryAction::Delete => "delete",
            InventoryAction::Stock => "stock",
        }
    }
}

/// The part of an item an event carries.
#[derive(Debug, Serialize)]
struct StockSnapshot<'a> {
    id: i64,
    code: &'a str,
    quantity: i64,
}

impl ServerEvent {
    pub fn inventory(action: InventoryAction, item: &InventoryItem) -> Self {
        let snapshot = StockSnapshot {
            id: item.id,
            code: &item.code,
            quantity: item.quantity,
        };

        ServerEvent {
            kind: "inventory",
            data: json!({ "action": action.as_str(), "item": snapshot }),
        }
    }
}

/// Fan-out channel shared by all handlers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        EventBus { tx }
    }

    /// Sends to every current subscriber. Having none is not an error.
    pub fn publish(&self, event: ServerEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(receivers, "Event published");
    }

    pub fn publish_inventory(&self, action: InventoryAction, item: &InventoryItem) {
        self.publish(ServerEvent::inventory(action, item));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /api/events`
pub async fn stream_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|message| {
        match message {
            Ok(event) => match Event::default().json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    warn!(error = %e, "Failed to encode event");
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event subscriber lagged");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
