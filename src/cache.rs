//! Last published snapshot, kept for instant display on attach.
//!
//! Snapshot and capture time live in one record and one file, so a reader never
//! sees a snapshot paired with another snapshot's timestamp.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::StorageError;
use crate::model::{AssetClass, SentimentSnapshot};
use crate::persist::{read_json, to_json, write_atomic};

pub const CACHE_FILE: &str = "last_reading.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedReading {
    pub snapshot: SentimentSnapshot,
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Wall-clock capture time in epoch milliseconds; independent of
    /// `snapshot.current.timestamp`.
    pub captured_at_ms: i64,
}

impl CachedReading {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        let ms = now.timestamp_millis().saturating_sub(self.captured_at_ms);
        Duration::from_millis(ms.max(0) as u64)
    }

    /// Strictly older than `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.age(now) > stale_after
    }
}

#[derive(Debug)]
pub struct LocalCache {
    path: Option<PathBuf>,
    entry: RwLock<Option<CachedReading>>,
    /// Serializes file writes; the lock on `entry` is never held across one.
    writer: AsyncMutex<()>,
}

impl LocalCache {
    /// Unreadable or corrupt cache files are treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entry = match read_json::<CachedReading>(&path) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache unreadable, starting empty");
                None
            }
        };
        Self {
            path: Some(path),
            entry: RwLock::new(entry),
            writer: AsyncMutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(CACHE_FILE))
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entry: RwLock::new(None),
            writer: AsyncMutex::new(()),
        }
    }

    pub fn load(&self) -> Option<CachedReading> {
        self.entry.read().clone()
    }

    /// Replace the cached record. The in-memory copy is swapped first and is
    /// always updated; the returned error only reports that persisting failed.
    pub async fn store(
        &self,
        snapshot: &SentimentSnapshot,
        asset_class: AssetClass,
        captured_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        *self.entry.write() = Some(CachedReading {
            snapshot: snapshot.clone(),
            asset_class,
            captured_at_ms: captured_at.timestamp_millis(),
        });
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _writing = self.writer.lock().await;
        // Re-read under the writer so the last write to land is the newest record.
        let latest = self.entry.read().clone();
        let Some(record) = latest else {
            return Ok(());
        };
        write_atomic(path, &to_json(&record)?).await
    }
}
