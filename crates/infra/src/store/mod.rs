//! Persistence gateway implementations.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDatabase;
pub use postgres::PostgresDatabase;
