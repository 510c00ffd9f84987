//! Render cache: content-hash key → rendered PNG path.
//!
//! The rasteriser only trusts an entry whose file still exists, so a store
//! never needs to know when images are deleted. Eviction is left to whoever
//! owns the work directory.

use crate::error::Html2LatexError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key-value store for rendered table images.
///
/// Implementations must be `Send + Sync`: tables in a batch are rendered
/// concurrently and share one store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<PathBuf>, Html2LatexError>;
    fn set(&self, key: &str, path: &Path) -> Result<(), Html2LatexError>;
}

fn poisoned() -> Html2LatexError {
    Html2LatexError::Cache("cache lock poisoned".into())
}

/// Process-local cache. Forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<PathBuf>, Html2LatexError> {
        Ok(self.entries.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &str, path: &Path) -> Result<(), Html2LatexError> {
        self.entries
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), path.to_path_buf());
        Ok(())
    }
}

/// Cache persisted as a JSON object in a single file, so renders survive
/// across runs. Every `set` rewrites the file atomically (temp + rename).
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl JsonFileCache {
    /// Load the cache at `path`, or start empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Html2LatexError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Html2LatexError::Cache(format!("'{}' is not a valid cache file: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Html2LatexError::io(&path, e)),
        };
        debug!("Opened render cache {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, PathBuf>) -> Result<(), Html2LatexError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Html2LatexError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Html2LatexError::Cache(format!("serialise: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| Html2LatexError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| Html2LatexError::io(&self.path, e))
    }
}

impl CacheStore for JsonFileCache {
    fn get(&self, key: &str) -> Result<Option<PathBuf>, Html2LatexError> {
        Ok(self.entries.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &str, path: &Path) -> Result<(), Html2LatexError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), path.to_path_buf());
        self.persist(&entries)
    }
}
