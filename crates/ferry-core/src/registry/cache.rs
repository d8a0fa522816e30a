//! Locator-keyed cache of resolved provider state
//!
//! Resolved state for one locator is value-equal no matter who resolved it,
//! so concurrent writers simply overwrite each other.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::provider::{Locator, ProviderState};

pub trait StateCache: Send + Sync {
    fn get(&self, locator: &Locator) -> Option<ProviderState>;
    fn put(&self, state: &ProviderState);
    fn invalidate(&self, locator: &Locator);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryStateCache {
    entries: Mutex<HashMap<Locator, ProviderState>>,
}

impl MemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateCache for MemoryStateCache {
    fn get(&self, locator: &Locator) -> Option<ProviderState> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(locator)
            .cloned()
    }

    fn put(&self, state: &ProviderState) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(state.locator.clone(), state.clone());
    }

    fn invalidate(&self, locator: &Locator) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(locator);
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedState {
    state: ProviderState,
    cached_at: DateTime<Utc>,
}

/// One JSON file per locator under the user's state directory.
///
/// Entries are named `<blake3(locator)>.json` and written via a temporary
/// file plus rename. Unreadable or expired entries count as misses; write
/// failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct FileStateCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileStateCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: None,
        }
    }

    /// Entries older than `ttl` are treated as missing.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// `$XDG_STATE_HOME/ferry/state` on Unix (falling back to the local data
    /// directory), `%LOCALAPPDATA%\ferry\state` on Windows.
    pub fn default_dir() -> Result<PathBuf> {
        let base = if cfg!(unix) {
            dirs::state_dir().or_else(dirs::data_local_dir)
        } else {
            dirs::data_local_dir()
        }
        .ok_or_else(|| Error::Config("Cannot determine state directory".to_string()))?;
        Ok(base.join("ferry").join("state"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, locator: &Locator) -> PathBuf {
        let key = blake3::hash(locator.as_str().as_bytes()).to_hex();
        self.dir.join(format!("{}.json", key))
    }

    fn write(&self, state: &ProviderState) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::read_path(&self.dir, e))?;
        let entry = CachedState {
            state: state.clone(),
            cached_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&entry)?;
        let path = self.entry_path(&state.locator);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StateCache for FileStateCache {
    fn get(&self, locator: &Locator) -> Option<ProviderState> {
        let path = self.entry_path(locator);
        let bytes = fs::read(&path).ok()?;
        let entry: CachedState = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                return None;
            }
        };
        if &entry.state.locator != locator {
            return None;
        }
        if let Some(ttl) = self.ttl
            && Utc::now() - entry.cached_at > ttl
        {
            debug!("Cache entry for {} expired", locator);
            return None;
        }
        Some(entry.state)
    }

    fn put(&self, state: &ProviderState) {
        if let Err(e) = self.write(state) {
            warn!("Failed to cache state for {}: {}", state.locator, e);
        }
    }

    fn invalidate(&self, locator: &Locator) {
        let path = self.entry_path(locator);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove cache entry {}: {}", path.display(), e),
        }
    }
}
