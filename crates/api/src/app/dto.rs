use serde::Deserialize;

use eventhub_ticketing::{EventFields, EventStatus};

pub type CreateEventRequest = EventFields;

/// Full replacement payload: every event field plus the new status.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(flatten)]
    pub fields: EventFields,
    pub status: EventStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub event_id: Option<i64>,
}
