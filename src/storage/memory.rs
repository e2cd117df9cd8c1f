//! In-memory table that records every batch it receives.

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::storage::{InsertableTable, SinkResult};

pub struct MemoryTable<T> {
    batches: Mutex<Vec<Vec<T>>>,
    /// When set, every insert fails with this message and records nothing
    failure: Option<String>,
}

impl<T: Clone> MemoryTable<T> {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A table whose inserts always fail
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Batches in the order they were inserted
    pub async fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().await.clone()
    }

    /// All recorded rows, flattened across batches
    pub async fn rows(&self) -> Vec<T> {
        self.batches.lock().await.iter().flatten().cloned().collect()
    }
}

impl<T: Clone> Default for MemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> InsertableTable<T> for MemoryTable<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn insert(&self, rows: Vec<T>) -> SinkResult<()> {
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}").into());
        }
        self.batches.lock().await.push(rows);
        Ok(())
    }
}
