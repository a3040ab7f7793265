use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventhub_core::{Entity, EventId, TicketId, UserId};

use crate::literal::literal_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Available,
    #[default]
    NotAvailable,
}

literal_enum!(TicketStatus, "ticket status", {
    Available => "available",
    NotAvailable => "not_available",
});

/// A ticket held by one user for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(id: TicketId, user_id: UserId, event_id: EventId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            event_id,
            status: TicketStatus::default(),
            created_at,
        }
    }
}

impl Entity for Ticket {
    type Id = TicketId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ticket_is_not_available() {
        let t = Ticket::new(TicketId::new(1), UserId::new(2), EventId::new(3), Utc::now());
        assert_eq!(t.status, TicketStatus::NotAvailable);
        assert_eq!(t.status.as_str(), "not_available");
    }

    #[test]
    fn parses_storage_literals() {
        assert_eq!("available".parse::<TicketStatus>().unwrap(), TicketStatus::Available);
        assert!("sold".parse::<TicketStatus>().is_err());
    }
}
