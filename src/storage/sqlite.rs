use crate::models::ConnectionRow;
use crate::storage::{InsertableTable, SinkResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Number;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteConnectionsTable {
    pool: Arc<SqlitePool>,
    table: String,
    insert_sql: String,
}

impl SqliteConnectionsTable {
    /// `table` must already be a plain SQL identifier (see [`crate::config`]).
    pub async fn new(database_url: &str, max_connections: u32, table: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
            table: table.to_string(),
            insert_sql: format!(
                r#"
                INSERT INTO {table} (server_id, start_timestamp, end_timestamp, bytes_transferred, tunnel_time_sec, countries)
                VALUES (?, ?, ?, ?, ?, ?)
                "#
            ),
        })
    }

    /// Create the connections table if it does not exist
    pub async fn init(&self) -> Result<()> {
        // `countries` holds a JSON array of country codes
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id TEXT NOT NULL,
                start_timestamp TEXT NOT NULL,
                end_timestamp TEXT NOT NULL,
                bytes_transferred REAL NOT NULL,
                tunnel_time_sec REAL,
                countries TEXT NOT NULL
            )
            "#,
            self.table
        ))
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{0}_server_start ON {0}(server_id, start_timestamp)",
            self.table
        ))
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl InsertableTable<ConnectionRow> for SqliteConnectionsTable {
    async fn insert(&self, rows: Vec<ConnectionRow>) -> SinkResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for row in &rows {
            sqlx::query(&self.insert_sql)
                .bind(&row.server_id)
                .bind(&row.start_timestamp)
                .bind(&row.end_timestamp)
                .bind(row.bytes_transferred.as_f64())
                .bind(row.tunnel_time_sec.as_ref().and_then(Number::as_f64))
                .bind(serde_json::to_string(&row.countries)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("Inserted {} rows into {}", rows.len(), self.table);
        Ok(())
    }
}
