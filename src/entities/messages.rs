use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Delivery state machine for a direct message.
///
/// Transitions are monotonic: `sent -> {queued|delivered}`,
/// `queued -> delivered`, `delivered -> read`. The store only ever holds
/// `sent`, `delivered` and `read`; `queued` lives in the offline queue and
/// on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Queued,
    Delivered,
    Read,
}

impl MessageStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Queued => "queued",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }

    /// Whether `next` is a legal forward step from `self`.
    pub const fn can_become(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (MessageStatus::Sent, MessageStatus::Queued)
                | (MessageStatus::Sent, MessageStatus::Delivered)
                | (MessageStatus::Queued, MessageStatus::Delivered)
                | (MessageStatus::Delivered, MessageStatus::Read)
        )
    }
}

impl Display for MessageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::MessageStatus::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(Sent.can_become(Queued));
        assert!(Sent.can_become(Delivered));
        assert!(Queued.can_become(Delivered));
        assert!(Delivered.can_become(Read));
    }

    #[test]
    fn status_never_regresses() {
        assert!(!Delivered.can_become(Queued));
        assert!(!Delivered.can_become(Sent));
        assert!(!Read.can_become(Delivered));
        assert!(!Queued.can_become(Sent));
    }

    #[test]
    fn read_requires_prior_delivery() {
        assert!(!Sent.can_become(Read));
        assert!(!Queued.can_become(Read));
    }
}
