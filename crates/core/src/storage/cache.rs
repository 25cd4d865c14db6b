use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::rates::RateSnapshot;

/// Single-record store holding the latest-known rate snapshot.
///
/// Injected into the rate fetcher and the cache-reading calculation so tests
/// can substitute [`MemoryRateCache`] for the file-backed store.
pub trait RateCache: Send + Sync {
    /// Replace any previous content with `snapshot`.
    fn write(&self, snapshot: &RateSnapshot) -> Result<(), CoreError>;

    /// Read the stored snapshot. Fails with `CacheRead` when nothing has been
    /// written yet or the stored content is not a well-formed rate mapping.
    fn read(&self) -> Result<RateSnapshot, CoreError>;
}

/// Cache kept in a single JSON file (flat `code → rate` object).
///
/// Writes truncate and rewrite the file in place; they are not atomic. A
/// reader opening the file during a write can observe truncated content and
/// will get a `CacheRead` error. There is no locking or versioning.
#[derive(Debug, Clone)]
pub struct FileRateCache {
    path: PathBuf,
}

impl FileRateCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateCache for FileRateCache {
    fn write(&self, snapshot: &RateSnapshot) -> Result<(), CoreError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| CoreError::CacheWrite(format!("Failed to serialize snapshot: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            CoreError::CacheWrite(format!("Failed to write {}: {e}", self.path.display()))
        })?;
        log::info!("cached {} rates to {}", snapshot.len(), self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<RateSnapshot, CoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            CoreError::CacheRead(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            CoreError::CacheRead(format!("Malformed cache file {}: {e}", self.path.display()))
        })
    }
}

/// In-memory cache holding the serialized JSON, so reads go through the same
/// parse path as the file store.
#[derive(Debug, Default)]
pub struct MemoryRateCache {
    content: Mutex<Option<String>>,
}

impl MemoryRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load raw content, e.g. to simulate a corrupted cache.
    pub fn with_raw(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
        }
    }

    /// Raw stored content, if any.
    pub fn raw(&self) -> Option<String> {
        self.content.lock().ok().and_then(|c| c.clone())
    }
}

impl RateCache for MemoryRateCache {
    fn write(&self, snapshot: &RateSnapshot) -> Result<(), CoreError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| CoreError::CacheWrite(format!("Failed to serialize snapshot: {e}")))?;
        let mut guard = self
            .content
            .lock()
            .map_err(|_| CoreError::CacheWrite("cache lock poisoned".into()))?;
        *guard = Some(json);
        Ok(())
    }

    fn read(&self) -> Result<RateSnapshot, CoreError> {
        let guard = self
            .content
            .lock()
            .map_err(|_| CoreError::CacheRead("cache lock poisoned".into()))?;
        let content = guard
            .as_deref()
            .ok_or_else(|| CoreError::CacheRead("cache is empty".into()))?;
        serde_json::from_str(content)
            .map_err(|e| CoreError::CacheRead(format!("Malformed cache content: {e}")))
    }
}
