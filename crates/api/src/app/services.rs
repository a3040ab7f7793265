use std::sync::Arc;

use anyhow::Context;

use eventhub_infra::{AppConfig, InMemoryDatabase, PostgresDatabase};
use eventhub_ticketing::{Database, StoreError, UnitOfWork};

/// Shared handles every protected handler receives.
#[derive(Clone)]
pub struct AppServices {
    db: Arc<dyn Database>,
}

impl AppServices {
    pub fn from_database(db: impl Database + 'static) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Open the unit of work for one request.
    pub async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.db.begin().await
    }
}

/// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database {
        Some(db) => {
            let postgres = PostgresDatabase::connect(&db.url, db.max_connections)
                .await
                .context("failed to connect to Postgres")?;
            postgres
                .migrate()
                .await
                .context("failed to apply schema")?;
            tracing::info!(max_connections = db.max_connections, "using postgres store");
            Ok(AppServices::from_database(postgres))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Ok(AppServices::from_database(InMemoryDatabase::new()))
        }
    }
}
