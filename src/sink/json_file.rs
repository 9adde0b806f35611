use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use super::traits::SnapshotSink;
use crate::error::SinkError;

/// Sink persisted as a single JSON object on disk.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileSink {
    /// Load `path` if it exists, otherwise start empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), entries = entries.len(), "opened json sink");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), SinkError> {
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for JsonFileSink {
    async fn set(&self, key: &str, value: String) -> Result<(), SinkError> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.flush(&entries).await {
            // keep memory consistent with disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.json");

        let sink = JsonFileSink::open(&path).await.unwrap();
        sink.set("TOTALAMOUNT_2018-03-01", "162.5000".into()).await.unwrap();
        sink.set("DTLOW_2018-03-01", "undefined".into()).await.unwrap();
        drop(sink);

        let reopened = JsonFileSink::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("TOTALAMOUNT_2018-03-01").await.unwrap().as_deref(),
            Some("162.5000")
        );
        assert_eq!(
            reopened.get("DTLOW_2018-03-01").await.unwrap().as_deref(),
            Some("undefined")
        );
        assert!(reopened.get("MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(matches!(JsonFileSink::open(&path).await, Err(SinkError::Encode(_))));
    }

    #[tokio::test]
    async fn failed_write_does_not_stick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("s.json");
        let sink = JsonFileSink::open(&path).await.unwrap();

        assert!(matches!(sink.set("K", "1".into()).await, Err(SinkError::Io(_))));
        assert!(sink.get("K").await.unwrap().is_none());
    }
}
