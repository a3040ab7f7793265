use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use eventhub_core::{EventId, TicketId, UserId};
use eventhub_ticketing::{Database, Event, EventUpdate, NewEvent, StoreError, Ticket, UnitOfWork};

#[derive(Debug, Default)]
struct State {
    events: BTreeMap<EventId, Event>,
    tickets: HashMap<TicketId, Ticket>,
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<State>,
    next_event_id: AtomicI64,
    next_ticket_id: AtomicI64,
}

impl Shared {
    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory state lock poisoned".to_string()))
    }
}

/// In-memory database.
///
/// Intended for tests/dev. Ids come from counters that are never rolled back,
/// like a database sequence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    shared: Arc<Shared>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ticket for `event_id` outside of any unit of work.
    pub fn seed_ticket(&self, user_id: UserId, event_id: EventId) -> Result<Ticket, StoreError> {
        let id = TicketId::new(self.shared.next_ticket_id.fetch_add(1, Ordering::SeqCst) + 1);
        let ticket = Ticket::new(id, user_id, event_id, Utc::now());
        self.shared.write()?.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    /// Number of committed events.
    pub fn event_count(&self) -> usize {
        self.shared.read().map(|s| s.events.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(InMemoryUnitOfWork {
            shared: self.shared.clone(),
            staged: BTreeMap::new(),
        }))
    }
}

/// A pending write, kept until commit.
#[derive(Debug, Clone)]
enum Staged {
    Insert(Event),
    /// Applies only while the row still exists.
    Replace(Event),
    Delete,
}

impl Staged {
    fn event(&self) -> Option<&Event> {
        match self {
            Staged::Insert(event) | Staged::Replace(event) => Some(event),
            Staged::Delete => None,
        }
    }
}

/// Staged writes over the shared state.
///
/// Reads see committed state overlaid with this unit's own writes. `commit`
/// checks every staged write against the committed state and then applies
/// them all under one write lock; if any check fails nothing is applied.
/// `rollback` drops them.
pub struct InMemoryUnitOfWork {
    shared: Arc<Shared>,
    staged: BTreeMap<EventId, Staged>,
}

impl InMemoryUnitOfWork {
    fn lookup(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(staged.event().cloned());
        }
        Ok(self.shared.read()?.events.get(&id).cloned())
    }
}

fn check_staged(state: &State, id: EventId, staged: &Staged) -> Result<(), StoreError> {
    match staged {
        Staged::Insert(_) => Ok(()),
        Staged::Replace(_) if !state.events.contains_key(&id) => Err(StoreError::Conflict(
            format!("event {id} was deleted by another unit of work"),
        )),
        Staged::Replace(_) => Ok(()),
        Staged::Delete => {
            let tickets = state.tickets.values().filter(|t| t.event_id == id).count();
            if tickets > 0 {
                return Err(StoreError::Conflict(format!(
                    "event {id} still has {tickets} ticket(s)"
                )));
            }
            Ok(())
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn get_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        self.lookup(id)
    }

    async fn all_events(&mut self) -> Result<Vec<Event>, StoreError> {
        let mut merged = self.shared.read()?.events.clone();
        for (id, staged) in &self.staged {
            match staged.event() {
                Some(event) => {
                    merged.insert(*id, event.clone());
                }
                None => {
                    merged.remove(id);
                }
            }
        }
        Ok(merged.into_values().collect())
    }

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event, StoreError> {
        let id = EventId::new(self.shared.next_event_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = Event::from_new(id, event, Utc::now());
        self.staged.insert(id, Staged::Insert(stored.clone()));
        Ok(stored)
    }

    async fn replace_event(
        &mut self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<Option<Event>, StoreError> {
        let Some(mut event) = self.lookup(id)? else {
            return Ok(None);
        };
        event.apply(&update);
        // Replacing an event this unit inserted keeps it an insert.
        let staged = match self.staged.get(&id) {
            Some(Staged::Insert(_)) => Staged::Insert(event.clone()),
            _ => Staged::Replace(event.clone()),
        };
        self.staged.insert(id, staged);
        Ok(Some(event))
    }

    async fn delete_event(&mut self, id: EventId) -> Result<bool, StoreError> {
        if self.lookup(id)?.is_none() {
            return Ok(false);
        }
        match self.staged.get(&id) {
            Some(Staged::Insert(_)) => {
                self.staged.remove(&id);
            }
            _ => {
                self.staged.insert(id, Staged::Delete);
            }
        }
        Ok(true)
    }

    async fn count_event_tickets(&mut self, id: EventId) -> Result<u64, StoreError> {
        let state = self.shared.read()?;
        Ok(state.tickets.values().filter(|t| t.event_id == id).count() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnitOfWork { shared, staged } = *self;
        let mut state = shared.write()?;
        for (id, write) in &staged {
            check_staged(&state, *id, write)?;
        }
        for (id, write) in staged {
            match write {
                Staged::Insert(event) | Staged::Replace(event) => {
                    state.events.insert(id, event);
                }
                Staged::Delete => {
                    state.events.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
