//! Ticketing domain module.
//!
//! Events, users, tickets and payments as typed records, the persistence
//! contract they are stored through, and the [`EventManager`] that enforces
//! event ownership. Nothing here performs IO directly; storage is reached only
//! through [`repository::UnitOfWork`].

pub mod event;
pub mod literal;
pub mod manager;
pub mod payment;
pub mod repository;
pub mod ticket;
pub mod user;

pub use event::{Event, EventFields, EventStatus, EventUpdate, NewEvent};
pub use manager::{EventManager, EventManagerError};
pub use payment::{CardDetails, Payment, PaymentMethod, PaymentStatus};
pub use repository::{settle, Database, StoreError, UnitOfWork};
pub use ticket::{Ticket, TicketStatus};
pub use user::User;
