use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// A destination that accepts batches of rows.
///
/// A batch is written all-or-nothing; implementations must not retry.
#[async_trait]
pub trait InsertableTable<T: Send + 'static>: Send + Sync {
    /// Insert every row of the batch in one operation
    async fn insert(&self, rows: Vec<T>) -> SinkResult<()>;
}
