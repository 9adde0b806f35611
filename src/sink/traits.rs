use async_trait::async_trait;

use crate::error::SinkError;

/// Key/value store for daily scalar snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn set(&self, key: &str, value: String) -> Result<(), SinkError>;

    async fn get(&self, key: &str) -> Result<Option<String>, SinkError>;
}
