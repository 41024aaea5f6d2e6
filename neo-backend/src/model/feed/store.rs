//! Raw payload storage
//!
//! Payloads are stored verbatim and read back in insertion order. The file
//! store keeps one JSON envelope per line; a line that cannot be parsed is
//! skipped with a warning so one corrupt write does not hide the rest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo_core::{NeoError, RawPayload};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait RawStore: Send + Sync {
    async fn append(&self, payload: &RawPayload) -> Result<(), NeoError>;

    /// Every stored payload, oldest first
    async fn read_all(&self) -> Result<Vec<RawPayload>, NeoError>;

    async fn clear(&self) -> Result<(), NeoError>;
}

fn store_error(e: anyhow::Error) -> NeoError {
    NeoError::Store(format!("{:#}", e))
}

/// One line of the payload log
#[derive(Debug, Serialize, Deserialize)]
struct StoredPayload {
    id: Uuid,
    stored_at: DateTime<Utc>,
    payload: RawPayload,
}

/// JSON Lines file store
pub struct FileRawStore {
    path: PathBuf,
    /// Serializes writers; readers are not blocked
    write_lock: Mutex<()>,
}

impl FileRawStore {
    /// Open (or lazily create) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create raw store directory")?;
                info!("Created raw store directory: {:?}", parent);
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, payload: &RawPayload) -> Result<Uuid> {
        let entry = StoredPayload {
            id: Uuid::now_v7(),
            stored_at: Utc::now(),
            payload: payload.clone(),
        };
        let mut line = serde_json::to_string(&entry).context("Failed to serialize payload")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .context("Failed to open raw store file")?;
        file.write_all(line.as_bytes())
            .await
            .context("Failed to write raw store file")?;
        file.flush().await.context("Failed to flush raw store file")?;

        Ok(entry.id)
    }

    async fn read_lines(&self) -> Result<Vec<RawPayload>> {
        if !self.path.exists() {
            debug!("Raw store file does not exist yet: {:?}", self.path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .context("Failed to read raw store file")?;

        let mut payloads = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredPayload>(line) {
                Ok(entry) => payloads.push(entry.payload),
                Err(e) => warn!("Skipping unreadable raw store line {}: {}", line_no + 1, e),
            }
        }

        debug!("Loaded {} raw payloads from {:?}", payloads.len(), self.path);
        Ok(payloads)
    }

    async fn truncate(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .await
                .context("Failed to remove raw store file")?;
        }
        Ok(())
    }
}

#[async_trait]
impl RawStore for FileRawStore {
    async fn append(&self, payload: &RawPayload) -> Result<(), NeoError> {
        let id = self.append_line(payload).await.map_err(store_error)?;
        debug!("Stored raw payload {}", id);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<RawPayload>, NeoError> {
        self.read_lines().await.map_err(store_error)
    }

    async fn clear(&self) -> Result<(), NeoError> {
        self.truncate().await.map_err(store_error)?;
        info!("Cleared raw store {:?}", self.path);
        Ok(())
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryRawStore {
    payloads: RwLock<Vec<RawPayload>>,
}

impl MemoryRawStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payloads(payloads: Vec<RawPayload>) -> Self {
        Self {
            payloads: RwLock::new(payloads),
        }
    }
}

#[async_trait]
impl RawStore for MemoryRawStore {
    async fn append(&self, payload: &RawPayload) -> Result<(), NeoError> {
        self.payloads.write().await.push(payload.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<RawPayload>, NeoError> {
        Ok(self.payloads.read().await.clone())
    }

    async fn clear(&self) -> Result<(), NeoError> {
        self.payloads.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_roundtrip_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRawStore::open(temp_dir.path().join("nested").join("raw.jsonl"))
            .await
            .unwrap();

        assert!(store.read_all().await.unwrap().is_empty());

        let first = RawPayload::new(json!({ "near_earth_objects": { "2025-01-02": [], "2025-01-01": [] } }));
        let second = RawPayload::new(json!({ "element_count": 0 }));
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let loaded = store.read_all().await.unwrap();
        assert_eq!(loaded, vec![first.clone(), second]);

        // Key order inside a payload survives storage
        let keys: Vec<&String> = loaded[0].as_value()["near_earth_objects"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["2025-01-02", "2025-01-01"]);

        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
        store.clear().await.unwrap();

        store.append(&first).await.unwrap();
        assert_eq!(store.read_all().await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.jsonl");
        let store = FileRawStore::open(&path).await.unwrap();

        store.append(&RawPayload::new(json!({ "a": 1 }))).await.unwrap();
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{ not json\n\n");
        std::fs::write(&path, content).unwrap();
        store.append(&RawPayload::new(json!({ "b": 2 }))).await.unwrap();

        let loaded = store.read_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].as_value()["b"], 2);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryRawStore::with_payloads(vec![RawPayload::new(json!({ "x": 1 }))]);
        store.append(&RawPayload::new(json!({ "x": 2 }))).await.unwrap();
        assert_eq!(store.read_all().await.unwrap().len(), 2);
        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
