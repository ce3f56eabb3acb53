//! Event emission.
//!
//! Events are pushed from the daemon to subscribers as JSON-RPC
//! notifications. Each subscriber has an independent buffer sized by
//! `server.event_buffer`.
//!
//! Mail events carry confirmation tokens, which let anyone holding them
//! confirm a signature. They are withheld from every subscriber whose filter
//! does not name the mail category explicitly, including the default filter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use pytition_types::events::{Event, EventType, MAIL_CATEGORY};
use pytition_types::PetitionId;

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "petition", "mail", "organization", "account",
    /// "system".
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    /// Restrict petition events to these petitions.
    #[serde(default)]
    pub petition_ids: Option<Vec<PetitionId>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Build and emit an event stamped now.
    pub fn publish(&self, event_type: EventType, payload: serde_json::Value) {
        self.emit(Event::now(event_type, payload));
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        let category = event.event_type.category();
        match self.categories {
            Some(ref categories) => {
                if !categories.iter().any(|c| c == category) {
                    return false;
                }
            }
            None if category == MAIL_CATEGORY => return false,
            None => {}
        }

        // Only events carrying a petition_id are narrowed by it
        if let Some(ref petition_ids) = self.petition_ids {
            if let Some(pid) = event.payload.get("petition_id").and_then(|v| v.as_i64()) {
                if !petition_ids.contains(&pid) {
                    return false;
                }
            }
        }

        true
    }
}
