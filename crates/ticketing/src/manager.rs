//! Event lifecycle management with ownership checks.

use thiserror::Error;
use tracing::instrument;

use eventhub_core::{DomainError, EventId, UserId};

use crate::repository::{StoreError, UnitOfWork};
use crate::{Event, EventFields, EventUpdate, NewEvent};

#[derive(Debug, Error)]
pub enum EventManagerError {
    #[error("event not found with id: {0}")]
    NotFound(EventId),

    #[error("user {user_id} is not the organizer of event {event_id}")]
    Forbidden { event_id: EventId, user_id: UserId },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("something went wrong: {0}")]
    Internal(String),
}

impl From<StoreError> for EventManagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DomainError> for EventManagerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            e @ (DomainError::InvalidId(_) | DomainError::UnknownVariant { .. }) => {
                Self::Validation(e.to_string())
            }
        }
    }
}

/// Orchestrates event persistence for one request.
///
/// Every operation borrows the request's unit of work; committing or rolling
/// back is the caller's job.
pub struct EventManager;

impl EventManager {
    #[instrument(skip(uow, event_fields), fields(organizer_id = %organizer_id), err)]
    pub async fn create(
        uow: &mut dyn UnitOfWork,
        event_fields: EventFields,
        organizer_id: UserId,
    ) -> Result<Event, EventManagerError> {
        let new_event = NewEvent::new(event_fields, organizer_id)?;
        let event = uow.insert_event(new_event).await?;
        tracing::info!(event_id = %event.id, "event created");
        Ok(event)
    }

    #[instrument(skip(uow), fields(event_id = %event_id), err)]
    pub async fn get(uow: &mut dyn UnitOfWork, event_id: EventId) -> Result<Event, EventManagerError> {
        uow.get_event(event_id)
            .await?
            .ok_or(EventManagerError::NotFound(event_id))
    }

    #[instrument(skip(uow), err)]
    pub async fn list(uow: &mut dyn UnitOfWork) -> Result<Vec<Event>, EventManagerError> {
        Ok(uow.all_events().await?)
    }

    /// Total replace of the event's mutable attributes by its organizer.
    #[instrument(skip(uow, update), fields(event_id = %event_id, organizer_id = %organizer_id), err)]
    pub async fn update(
        uow: &mut dyn UnitOfWork,
        event_id: EventId,
        organizer_id: UserId,
        update: EventUpdate,
    ) -> Result<Event, EventManagerError> {
        Self::owned_event(uow, event_id, organizer_id).await?;

        let event = uow
            .replace_event(event_id, update)
            .await?
            .ok_or(EventManagerError::NotFound(event_id))?;
        tracing::info!(status = %event.status, "event updated");
        Ok(event)
    }

    /// Delete an event owned by `organizer_id`.
    ///
    /// Refused with `Conflict` while tickets still reference the event.
    #[instrument(skip(uow), fields(event_id = %event_id, organizer_id = %organizer_id), err)]
    pub async fn delete(
        uow: &mut dyn UnitOfWork,
        event_id: EventId,
        organizer_id: UserId,
    ) -> Result<(), EventManagerError> {
        Self::owned_event(uow, event_id, organizer_id).await?;

        let tickets = uow.count_event_tickets(event_id).await?;
        if tickets > 0 {
            return Err(EventManagerError::Conflict(format!(
                "event {event_id} still has {tickets} ticket(s)"
            )));
        }

        if !uow.delete_event(event_id).await? {
            return Err(EventManagerError::NotFound(event_id));
        }
        tracing::info!("event deleted");
        Ok(())
    }

    async fn owned_event(
        uow: &mut dyn UnitOfWork,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Event, EventManagerError> {
        let event = uow
            .get_event(event_id)
            .await?
            .ok_or(EventManagerError::NotFound(event_id))?;

        if !event.is_organized_by(user_id) {
            tracing::warn!(
                %event_id,
                %user_id,
                organizer_id = %event.organizer_id,
                "ownership check failed"
            );
            return Err(EventManagerError::Forbidden { event_id, user_id });
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_conflicts_become_conflicts() {
        let err: EventManagerError = StoreError::Conflict("tickets remain".to_string()).into();
        assert!(matches!(err, EventManagerError::Conflict(msg) if msg == "tickets remain"));
    }

    #[test]
    fn constraint_violations_are_internal() {
        let err: EventManagerError = StoreError::Constraint("fk users".to_string()).into();
        assert!(matches!(err, EventManagerError::Internal(msg) if msg.contains("fk users")));
    }

    #[test]
    fn other_store_faults_are_internal() {
        let err: EventManagerError = StoreError::Unavailable("pool closed".to_string()).into();
        assert!(matches!(err, EventManagerError::Internal(msg) if msg.contains("pool closed")));
    }

    #[test]
    fn domain_validation_maps_to_validation() {
        let err: EventManagerError = DomainError::validation("bad").into();
        assert!(matches!(err, EventManagerError::Validation(msg) if msg == "bad"));
    }
}
