//! Compiled-view cache keyed by view name.
//!
//! An entry is reused while the view file's modification time is unchanged;
//! a newer (or older) mtime triggers a reload on the next lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use crate::error::{io_err, EngineError};

struct Entry<T> {
    modified: SystemTime,
    compiled: Arc<T>,
}

/// Concurrency-safe cache shared by all render calls of one adapter.
pub struct ViewCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> ViewCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled view for `name`, calling `load` on a miss or when
    /// the file at `path` changed since it was cached.
    pub fn get_or_load<E, F>(&self, name: &str, path: &Path, load: F) -> Result<Arc<T>, E>
    where
        E: From<EngineError>,
        F: FnOnce(&Path) -> Result<T, E>,
    {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| E::from(io_err(path, e)))?;

        {
            // A poisoned lock still holds fully-inserted entries.
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(name) {
                if entry.modified == modified {
                    return Ok(Arc::clone(&entry.compiled));
                }
            }
        }

        let compiled = Arc::new(load(path)?);
        tracing::debug!(view = name, "compiled view cached");
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            name.to_string(),
            Entry {
                modified,
                compiled: Arc::clone(&compiled),
            },
        );
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn hit_skips_loader_until_mtime_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("home.page.tmpl");
        std::fs::write(&path, "one").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

        let cache: ViewCache<String> = ViewCache::new();
        let loads = Cell::new(0);
        let load = |p: &Path| -> Result<String, EngineError> {
            loads.set(loads.get() + 1);
            std::fs::read_to_string(p).map_err(|e| io_err(p, e))
        };

        assert_eq!(*cache.get_or_load("home", &path, load).unwrap(), "one");
        assert_eq!(*cache.get_or_load("home", &path, load).unwrap(), "one");
        assert_eq!(loads.get(), 1);

        std::fs::write(&path, "two").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_100, 0)).unwrap();
        assert_eq!(*cache.get_or_load("home", &path, load).unwrap(), "two");
        assert_eq!(loads.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let cache: ViewCache<String> = ViewCache::new();
        let err = cache
            .get_or_load("gone", &dir.path().join("gone"), |_| -> Result<String, EngineError> {
                Ok(String::new())
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
        assert!(cache.is_empty());
    }
}
