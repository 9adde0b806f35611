use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::traits::SnapshotSink;
use crate::error::SinkError;

/// Process-local sink. Values vanish on exit.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    entries: Arc<DashMap<String, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn set(&self, key: &str, value: String) -> Result<(), SinkError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}
