use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use eventhub_core::{DomainError, DomainResult, Entity, EventId, UserId};

use crate::literal::literal_enum;

pub const TITLE_MAX_CHARS: usize = 255;
pub const CATEGORY_MAX_CHARS: usize = 50;
pub const LOCATION_MAX_CHARS: usize = 120;

/// Event status lifecycle.
///
/// Any status may be replaced by any other on update; no transition table is
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    NotStarted,
    Continuing,
    Finished,
    Canceled,
}

literal_enum!(EventStatus, "event status", {
    NotStarted => "not_started",
    Continuing => "continuing",
    Finished => "finished",
    Canceled => "canceled",
});

/// Caller-supplied event attributes (the create payload, and the bulk of the
/// update payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time: NaiveTime,
    /// Price in smallest currency unit (e.g., cents).
    pub ticket_price: i64,
    pub max_ticket: i64,
    pub location: String,
}

impl EventFields {
    /// Check the constraints the storage columns impose.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        check_len("title", &self.title, TITLE_MAX_CHARS)?;
        check_len("category", &self.category, CATEGORY_MAX_CHARS)?;
        check_len("location", &self.location, LOCATION_MAX_CHARS)?;

        if self.ticket_price < 0 {
            return Err(DomainError::validation("ticket_price must be >= 0"));
        }
        if self.max_ticket < 0 {
            return Err(DomainError::validation("max_ticket must be >= 0"));
        }
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// A validated, not-yet-persisted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    organizer_id: UserId,
    fields: EventFields,
}

impl NewEvent {
    pub fn new(fields: EventFields, organizer_id: UserId) -> DomainResult<Self> {
        fields.validate()?;
        Ok(Self {
            organizer_id,
            fields,
        })
    }

    pub fn organizer_id(&self) -> UserId {
        self.organizer_id
    }

    pub fn fields(&self) -> &EventFields {
        &self.fields
    }
}

/// A validated total replacement of every mutable event attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdate {
    fields: EventFields,
    status: EventStatus,
}

impl EventUpdate {
    pub fn new(fields: EventFields, status: EventStatus) -> DomainResult<Self> {
        fields.validate()?;
        Ok(Self { fields, status })
    }

    pub fn fields(&self) -> &EventFields {
        &self.fields
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }
}

/// A persisted event.
///
/// # Invariants
/// - `organizer_id` never changes after creation.
/// - `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub organizer_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time: NaiveTime,
    pub ticket_price: i64,
    pub max_ticket: i64,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub status: EventStatus,
}

impl Event {
    /// Materialize a freshly inserted event: status starts at `not_started`.
    pub fn from_new(id: EventId, new_event: NewEvent, created_at: DateTime<Utc>) -> Self {
        let NewEvent {
            organizer_id,
            fields,
        } = new_event;
        let EventFields {
            title,
            description,
            category,
            start_date,
            end_date,
            time,
            ticket_price,
            max_ticket,
            location,
        } = fields;

        Self {
            id,
            organizer_id,
            title,
            description,
            category,
            start_date,
            end_date,
            time,
            ticket_price,
            max_ticket,
            location,
            created_at,
            status: EventStatus::default(),
        }
    }

    pub fn is_organized_by(&self, user_id: UserId) -> bool {
        self.organizer_id == user_id
    }

    /// Overwrite every mutable attribute; `id`, `organizer_id` and
    /// `created_at` are untouched.
    pub fn apply(&mut self, update: &EventUpdate) {
        let fields = update.fields().clone();
        self.title = fields.title;
        self.description = fields.description;
        self.category = fields.category;
        self.start_date = fields.start_date;
        self.end_date = fields.end_date;
        self.time = fields.time;
        self.ticket_price = fields.ticket_price;
        self.max_ticket = fields.max_ticket;
        self.location = fields.location;
        self.status = update.status();
    }

    /// The caller-editable attributes as they currently stand.
    pub fn fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            time: self.time,
            ticket_price: self.ticket_price,
            max_ticket: self.max_ticket,
            location: self.location.clone(),
        }
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
