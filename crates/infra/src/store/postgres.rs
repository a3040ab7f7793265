//! Postgres-backed database.
//!
//! Each unit of work is one SQL transaction. Rows are decoded through
//! hand-written `FromRow` impls and enum columns are mapped through the
//! domain's explicit literals.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Constraint` |
//! | Database (foreign key violation) in `delete_event` | `23503` | `Conflict` |
//! | Database (foreign key violation) elsewhere | `23503` | `Constraint` |
//! | Database (check constraint violation) | `23514` | `Constraint` |
//! | Database (other) | Any other | `Query` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | N/A | `Decode` |
//! | Other | N/A | `Query` |

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use eventhub_core::{EventId, UserId};
use eventhub_ticketing::{
    Database, Event, EventStatus, EventUpdate, NewEvent, StoreError, UnitOfWork,
};

/// Schema applied by [`PostgresDatabase::migrate`]. Idempotent.
pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const EVENT_COLUMNS: &str = r#"
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
    status
"#;

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn get_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;

        row.map(|r| decode_event(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn all_events(&mut self) -> Result<Vec<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("all_events", e))?;

        rows.iter().map(decode_event).collect()
    }

    #[instrument(skip(self, event), fields(organizer_id = %event.organizer_id()), err)]
    async fn insert_event(&mut self, event: NewEvent) -> Result<Event, StoreError> {
        let f = event.fields();
        let sql = format!(
            r#"
            INSERT INTO events (
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
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(event.organizer_id().get())
            .bind(&f.title)
            .bind(&f.description)
            .bind(&f.category)
            .bind(f.start_date)
            .bind(f.end_date)
            .bind(f.time)
            .bind(f.ticket_price)
            .bind(f.max_ticket)
            .bind(&f.location)
            .bind(EventStatus::default().as_str())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_event", e))?;

        decode_event(&row)
    }

    #[instrument(skip(self, update), fields(event_id = %id), err)]
    async fn replace_event(
        &mut self,
        id: EventId,
        update: EventUpdate,
    ) -> Result<Option<Event>, StoreError> {
        let f = update.fields();
        let sql = format!(
            r#"
            UPDATE events SET
                title = $2,
                description = $3,
                category = $4,
                start_date = $5,
                end_date = $6,
                time = $7,
                ticket_price = $8,
                max_ticket = $9,
                location = $10,
                status = $11
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(&f.title)
            .bind(&f.description)
            .bind(&f.category)
            .bind(f.start_date)
            .bind(f.end_date)
            .bind(f.time)
            .bind(f.ticket_price)
            .bind(f.max_ticket)
            .bind(&f.location)
            .bind(update.status().as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("replace_event", e))?;

        row.map(|r| decode_event(&r)).transpose()
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn delete_event(&mut self, id: EventId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn count_event_tickets(&mut self, id: EventId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
            .bind(id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_event_tickets", e))?;

        Ok(count.max(0) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// Raw `events` row.
#[derive(Debug, Clone)]
struct EventRow {
    id: i64,
    organizer_id: i64,
    title: String,
    description: String,
    category: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    time: NaiveTime,
    ticket_price: i64,
    max_ticket: i64,
    location: String,
    created_at: DateTime<Utc>,
    status: String,
}

impl<'r> FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EventRow {
            id: row.try_get("id")?,
            organizer_id: row.try_get("organizer_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            time: row.try_get("time")?,
            ticket_price: row.try_get("ticket_price")?,
            max_ticket: row.try_get("max_ticket")?,
            location: row.try_get("location")?,
            created_at: row.try_get("created_at")?,
            status: row.try_get("status")?,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status: EventStatus = row
            .status
            .parse()
            .map_err(|e: eventhub_core::DomainError| StoreError::Decode(e.to_string()))?;

        Ok(Event {
            id: EventId::new(row.id),
            organizer_id: UserId::new(row.organizer_id),
            title: row.title,
            description: row.description,
            category: row.category,
            start_date: row.start_date,
            end_date: row.end_date,
            time: row.time,
            ticket_price: row.ticket_price,
            max_ticket: row.max_ticket,
            location: row.location,
            created_at: row.created_at,
            status,
        })
    }
}

fn decode_event(row: &PgRow) -> Result<Event, StoreError> {
    let raw = EventRow::from_row(row).map_err(|e| map_sqlx_error("decode_event", e))?;
    Event::try_from(raw)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            classify_sqlstate(operation, db_err.code().as_deref(), msg)
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Decode(format!("{} in {}", e, operation))
        }
        other => StoreError::Query(format!("sqlx error in {}: {}", operation, other)),
    }
}

fn classify_sqlstate(operation: &str, code: Option<&str>, msg: String) -> StoreError {
    match (operation, code) {
        // ON DELETE RESTRICT: tickets still reference the event
        ("delete_event", Some("23503")) => StoreError::Conflict(msg),
        // unique, foreign key, check
        (_, Some("23505" | "23503" | "23514")) => StoreError::Constraint(msg),
        _ => StoreError::Query(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> EventRow {
        EventRow {
            id: 1,
            organizer_id: 7,
            title: "Jazz Night".to_string(),
            description: "Live quartet".to_string(),
            category: "Concerts".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            ticket_price: 15,
            max_ticket: 200,
            location: "Blue Room".to_string(),
            created_at: Utc::now(),
            status: status.to_string(),
        }
    }

    #[test]
    fn decodes_known_status_literals() {
        let event = Event::try_from(row("finished")).unwrap();
        assert_eq!(event.status, EventStatus::Finished);
        assert_eq!(event.id, EventId::new(1));
        assert_eq!(event.organizer_id, UserId::new(7));
    }

    #[test]
    fn unknown_status_literal_is_a_decode_error() {
        let err = Event::try_from(row("postponed")).unwrap_err();
        assert!(matches!(err, StoreError::Decode(msg) if msg.contains("postponed")));
    }

    #[test]
    fn pool_errors_mean_unavailable() {
        assert!(matches!(
            map_sqlx_error("begin", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("begin", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn other_errors_are_query_failures() {
        assert!(matches!(
            map_sqlx_error("get_event", sqlx::Error::RowNotFound),
            StoreError::Query(msg) if msg.contains("get_event")
        ));
    }

    #[test]
    fn schema_declares_restrictive_ticket_reference() {
        assert!(SCHEMA.contains("REFERENCES events (id) ON DELETE RESTRICT"));
    }

    #[test]
    fn restricted_delete_is_a_conflict_but_other_fk_failures_are_not() {
        assert!(matches!(
            classify_sqlstate("delete_event", Some("23503"), "fk".to_string()),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            classify_sqlstate("insert_event", Some("23503"), "fk".to_string()),
            StoreError::Constraint(_)
        ));
        assert!(matches!(
            classify_sqlstate("insert_event", Some("42P01"), "missing".to_string()),
            StoreError::Query(_)
        ));
    }
}
