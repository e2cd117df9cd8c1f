pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryTable;
pub use postgres::PostgresConnectionsTable;
pub use sqlite::SqliteConnectionsTable;
pub use trait_def::{InsertableTable, SinkError, SinkResult};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::models::ConnectionRow;

/// Connects to the configured backend and provisions the connections table.
pub async fn open_connections_table(
    config: &DatabaseConfig,
) -> Result<Arc<dyn InsertableTable<ConnectionRow>>> {
    let table: Arc<dyn InsertableTable<ConnectionRow>> = match config.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.url);
            let table =
                SqliteConnectionsTable::new(&config.url, config.max_connections, &config.table)
                    .await?;
            table.init().await?;
            Arc::new(table)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.url);
            let table =
                PostgresConnectionsTable::new(&config.url, config.max_connections, &config.table)
                    .await?;
            table.init().await?;
            Arc::new(table)
        }
    };
    info!("Table '{}' is ready", config.table);
    Ok(table)
}
