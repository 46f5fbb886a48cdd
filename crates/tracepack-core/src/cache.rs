//! Cross-call memoization of module lookups.
//!
//! The cache is owned by the caller and may be shared by several closure
//! computations (one per deployable entry point). It is not synchronized:
//! callers sharing one across threads must serialize access themselves.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Composite key of one lookup: the directory resolution starts from, and the specifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub base_dir: PathBuf,
    pub specifier: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(base_dir: &Path, specifier: &str) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            specifier: specifier.to_string(),
        }
    }
}

/// Membership store for already-handled lookups.
///
/// A key present in the cache means an earlier computation already emitted
/// whatever that lookup contributes; the lookup is skipped, not replayed.
pub trait ResolutionCache {
    fn has(&self, key: &CacheKey) -> bool;

    fn add(&mut self, key: CacheKey);
}

/// In-memory cache backed by a `HashSet`. No eviction.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    keys: HashSet<CacheKey>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ResolutionCache for MemoryCache {
    fn has(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    fn add(&mut self, key: CacheKey) {
        self.keys.insert(key);
    }
}

/// No-op cache implementation (always misses).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResolutionCache for NoCache {
    fn has(&self, _key: &CacheKey) -> bool {
        false
    }

    fn add(&mut self, _key: CacheKey) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_membership() {
        let mut cache = MemoryCache::new();
        let key = CacheKey::new(Path::new("/srv/app"), "libx");

        assert!(!cache.has(&key));
        cache.add(key.clone());
        assert!(cache.has(&key));

        // Adding twice keeps one entry
        cache.add(key);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_includes_base_dir() {
        let mut cache = MemoryCache::new();
        cache.add(CacheKey::new(Path::new("/srv/app"), "libx"));

        assert!(!cache.has(&CacheKey::new(Path::new("/srv/app/node_modules/liby"), "libx")));
    }

    #[test]
    fn test_no_cache_always_misses() {
        let mut cache = NoCache;
        let key = CacheKey::new(Path::new("/"), "a");
        cache.add(key.clone());
        assert!(!cache.has(&key));
    }
}
