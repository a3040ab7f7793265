//! Persistence contract consumed by the domain.
//!
//! A [`Database`] hands out one [`UnitOfWork`] per request. Every read and
//! write of that request goes through it, and the caller finishes it with
//! exactly one of `commit` / `rollback` (see [`settle`]).

use async_trait::async_trait;
use thiserror::Error;

use eventhub_core::EventId;

use crate::{Event, EventUpdate, NewEvent};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, ownership).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A referential or check constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The write contradicts the current state of the row: tickets still
    /// reference an event being deleted, or the row was removed by another
    /// unit of work since it was read.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("failed to decode stored row: {0}")]
    Decode(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// One transactional scope.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn get_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// All events, in store-defined order.
    async fn all_events(&mut self) -> Result<Vec<Event>, StoreError>;

    /// Insert and return the stored record (id, created_at and status filled in).
    async fn insert_event(&mut self, event: NewEvent) -> Result<Event, StoreError>;

    /// Overwrite every mutable attribute. `None` when no such event exists.
    async fn replace_event(
        &mut self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<Option<Event>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_event(&mut self, id: EventId) -> Result<bool, StoreError>;

    /// Number of tickets referencing the event.
    async fn count_event_tickets(&mut self, id: EventId) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Source of units of work (connection pool, in-memory state, ...).
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

/// Commit on success, roll back on failure, and hand the outcome back.
///
/// A failed rollback is logged; the original error is what the caller sees.
pub async fn settle<T, E>(uow: Box<dyn UnitOfWork>, result: Result<T, E>) -> Result<T, E>
where
    E: From<StoreError>,
{
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
