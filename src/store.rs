//! Persisted key-value settings: the store trait, two implementations, and a
//! typed wrapper for the handful of keys the capture pipeline uses.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Key for the global enable flag. Default: false.
pub const KEY_GLOBALLY_ENABLED: &str = "isGloballyEnabled";
/// Key for the navigation auto-capture flag. Default: true.
pub const KEY_AUTO_CAPTURE: &str = "autoCapture";
/// Key for the allowlisted hostnames. Default: empty.
pub const KEY_ALLOWED_SITES: &str = "allowedSites";

/// Flat JSON-valued key-value store shared by the coordinator and the
/// settings panel. Implementations must tolerate concurrent access; no
/// read-modify-write atomicity is promised across calls.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cells.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.cells.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store: the whole map lives in one JSON file, rewritten on
/// every `set`. Suits the small settings/counter map this crate keeps.
pub struct JsonFileStore {
    path: PathBuf,
    cells: Mutex<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`. A missing file starts empty; an
    /// unreadable or malformed file is an error rather than silent data loss.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cells = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::StorageError(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::IoError(e)),
        };
        Ok(Self {
            path,
            cells: Mutex::new(cells),
        })
    }

    async fn flush(&self, cells: &HashMap<String, Value>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cells)
            .map_err(|e| Error::StorageError(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cells.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut cells = self.cells.lock().await;
        cells.insert(key.to_string(), value);
        self.flush(&cells).await
    }
}

/// Typed view over a [`KvStore`] for the settings and counters the pipeline
/// reads and writes.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KvStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn is_globally_enabled(&self) -> Result<bool> {
        Ok(self
            .store
            .get(KEY_GLOBALLY_ENABLED)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    pub async fn set_globally_enabled(&self, enabled: bool) -> Result<()> {
        self.store.set(KEY_GLOBALLY_ENABLED, Value::Bool(enabled)).await
    }

    pub async fn auto_capture(&self) -> Result<bool> {
        Ok(self
            .store
            .get(KEY_AUTO_CAPTURE)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(true))
    }

    pub async fn set_auto_capture(&self, enabled: bool) -> Result<()> {
        self.store.set(KEY_AUTO_CAPTURE, Value::Bool(enabled)).await
    }

    pub async fn allowed_sites(&self) -> Result<Vec<String>> {
        let sites = self
            .store
            .get(KEY_ALLOWED_SITES)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Ok(sites)
    }

    pub async fn set_allowed_sites(&self, sites: &[String]) -> Result<()> {
        let value = serde_json::to_value(sites)
            .map_err(|e| Error::StorageError(e.to_string()))?;
        self.store.set(KEY_ALLOWED_SITES, value).await
    }

    pub async fn is_site_allowed(&self, hostname: &str) -> Result<bool> {
        Ok(self.allowed_sites().await?.iter().any(|s| s == hostname))
    }

    /// Consume the next sequence number for `site_key`: read the counter,
    /// increment, write back. The first request for a site yields 1.
    /// Read-modify-write is not atomic across concurrent requests; interleaved
    /// requests can observe the same number. Accepted, matching the original
    /// counter semantics.
    pub async fn next_sequence(&self, site_key: &str) -> Result<u64> {
        let key = counter_key(site_key);
        let current = self
            .store
            .get(&key)
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let next = current + 1;
        self.store.set(&key, Value::from(next)).await?;
        debug!(site = site_key, sequence = next, "assigned capture sequence");
        Ok(next)
    }
}

/// Storage key holding the capture counter for one site.
pub fn counter_key(site_key: &str) -> String {
    format!("counter_{site_key}")
}
