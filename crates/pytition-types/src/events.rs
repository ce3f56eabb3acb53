//! Domain events pushed to subscribers of the daemon.
//!
//! The mail transport and the web layer subscribe to these to send
//! confirmation emails and refresh caches. Events in the "mail" category
//! carry confirmation tokens and are only delivered to subscribers that
//! ask for that category by name.

use serde::{Deserialize, Serialize};

/// Envelope for all daemon events.
#[derive(Clone, Debug, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: u64,
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
}

impl Event {
    /// Build an event stamped with the current time.
    pub fn now(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            timestamp: crate::unix_now(),
            payload,
        }
    }
}

/// Category of events that carry confirmation tokens.
pub const MAIL_CATEGORY: &str = "mail";

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Petition events
    SignatureRecorded,
    SignatureConfirmed,
    PetitionPublished,
    PetitionUnpublished,

    // Mail events
    ConfirmationRequested,

    // Organization events
    MemberAdded,
    MemberRemoved,
    MemberInvited,

    // Account events
    AccountRegistered,
    AccountDeleted,

    // System events
    DaemonStatus,
}

impl EventType {
    /// Subscription category this event belongs to.
    pub fn category(&self) -> &'static str {
        match self {
            Self::SignatureRecorded
            | Self::SignatureConfirmed
            | Self::PetitionPublished
            | Self::PetitionUnpublished => "petition",
            Self::ConfirmationRequested => MAIL_CATEGORY,
            Self::MemberAdded | Self::MemberRemoved | Self::MemberInvited => "organization",
            Self::AccountRegistered | Self::AccountDeleted => "account",
            Self::DaemonStatus => "system",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(EventType::SignatureConfirmed.category(), "petition");
        assert_eq!(EventType::MemberInvited.category(), "organization");
        assert_eq!(EventType::AccountDeleted.category(), "account");
        assert_eq!(EventType::DaemonStatus.category(), "system");
        assert_eq!(EventType::ConfirmationRequested.category(), "mail");
    }

    #[test]
    fn test_event_json() {
        let event = Event {
            event_type: EventType::SignatureRecorded,
            timestamp: 1000,
            payload: serde_json::json!({"petition_id": 1}),
        };
        let json = serde_json::to_value(&event).expect("ser");
        assert_eq!(json["event_type"], "signature_recorded");
        assert_eq!(json["payload"]["petition_id"], 1);
    }
}
