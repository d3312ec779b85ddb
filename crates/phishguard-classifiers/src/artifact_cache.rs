//! Parsed model artifacts cached by path
//!
//! Scans run concurrently and mostly read, so entries sit behind a
//! read-mostly lock. An entry lives until it is explicitly invalidated;
//! failed loads are never cached.

use parking_lot::RwLock;
use phishguard_core::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache of parsed artifacts keyed by file path
pub struct ArtifactCache<T> {
    entries: RwLock<HashMap<PathBuf, Arc<T>>>,
}

impl<T> ArtifactCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached artifact for `path`, loading it on first access
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        if let Some(hit) = self.entries.read().get(path) {
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(load(path)?);
        tracing::debug!(path = %path.display(), "cached model artifact");

        // A concurrent loader may have won the race; keep whichever landed first
        let mut entries = self.entries.write();
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&loaded));
        Ok(Arc::clone(entry))
    }

    /// Drop the entry for `path`; returns whether one existed
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.write().remove(path).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T> Default for ArtifactCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Load through the cache when one is configured, otherwise load fresh
pub fn load_through<T, F>(cache: Option<&ArtifactCache<T>>, path: &Path, load: F) -> Result<Arc<T>>
where
    F: FnOnce(&Path) -> Result<T>,
{
    match cache {
        Some(cache) => cache.get_or_load(path, load),
        None => load(path).map(Arc::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishguard_core::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_loads_once_until_invalidated() {
        let cache: ArtifactCache<u32> = ArtifactCache::new();
        let loads = AtomicU32::new(0);
        let path = Path::new("models/a.npy");

        let load = |_: &Path| {
            loads.fetch_add(1, Ordering::Relaxed);
            Ok(7)
        };

        assert_eq!(*cache.get_or_load(path, load).unwrap(), 7);
        assert_eq!(*cache.get_or_load(path, load).unwrap(), 7);
        assert_eq!(loads.load(Ordering::Relaxed), 1);
        assert!(cache.contains(path));

        assert!(cache.invalidate(path));
        assert!(!cache.invalidate(path));
        cache.get_or_load(path, load).unwrap();
        assert_eq!(loads.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let cache: ArtifactCache<u32> = ArtifactCache::new();
        let path = Path::new("models/missing.npy");

        let result = cache.get_or_load(path, |p| Err(Error::ArtifactNotFound(p.to_path_buf())));
        assert!(matches!(result, Err(Error::ArtifactNotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_through_without_cache() {
        let loads = AtomicU32::new(0);
        let path = Path::new("models/a.json");
        for _ in 0..3 {
            load_through::<u32, _>(None, path, |_| {
                loads.fetch_add(1, Ordering::Relaxed);
                Ok(1)
            })
            .unwrap();
        }
        assert_eq!(loads.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_clear() {
        let cache: ArtifactCache<u32> = ArtifactCache::new();
        cache.get_or_load(Path::new("a"), |_| Ok(1)).unwrap();
        cache.get_or_load(Path::new("b"), |_| Ok(2)).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
