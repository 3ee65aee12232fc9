//! Parsed-script caching for repeated loads.
//!
//! This module provides a thread-safe cache for parsed programs, enabling
//! efficient reuse when the same script file is loaded more than once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{Result, SandboxError};
use crate::interp::ast::Program;
use crate::interp::parse;

/// A thread-safe cache of parsed programs keyed by filesystem path.
///
/// Multiple loads of the same script share one parsed tree and skip
/// re-reading and re-parsing the source.
#[derive(Debug, Default)]
pub struct ScriptCache {
    /// The cached programs, keyed by canonical path.
    cache: RwLock<HashMap<PathBuf, Arc<Program>>>,
}

impl ScriptCache {
    /// Create a new empty script cache.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached program or read and parse it if not present.
    ///
    /// The path is canonicalized before lookup so relative paths, absolute
    /// paths and symlinks to the same file share one entry.
    pub fn get_or_parse(&self, path: impl AsRef<Path>) -> Result<Arc<Program>> {
        let path = path.as_ref();

        let canonical_path = std::fs::canonicalize(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::ScriptNotFound(path.display().to_string())
            } else {
                SandboxError::Io(e)
            }
        })?;

        // Try the cache first (read lock).
        {
            let cache = self.cache.read().unwrap();
            if let Some(program) = cache.get(&canonical_path) {
                return Ok(Arc::clone(program));
            }
        }

        // Not cached: read and parse outside any lock.
        let source = std::fs::read_to_string(&canonical_path).map_err(SandboxError::Io)?;
        let program = Arc::new(parse(&source).map_err(SandboxError::from)?);

        // Insert under the write lock.
        {
            let mut cache = self.cache.write().unwrap();
            // Double-check: another thread might have parsed it meanwhile.
            if let Some(existing) = cache.get(&canonical_path) {
                return Ok(Arc::clone(existing));
            }
            cache.insert(canonical_path, Arc::clone(&program));
        }

        Ok(program)
    }

    /// Check if a script is cached.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        if let Ok(canonical) = std::fs::canonicalize(path.as_ref()) {
            let cache = self.cache.read().unwrap();
            cache.contains_key(&canonical)
        } else {
            false
        }
    }

    /// Remove a script from the cache.
    ///
    /// Returns `true` if the script was present and removed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        if let Ok(canonical) = std::fs::canonicalize(path.as_ref()) {
            let mut cache = self.cache.write().unwrap();
            cache.remove(&canonical).is_some()
        } else {
            false
        }
    }

    /// Clear all cached scripts.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap();
        cache.clear();
    }

    /// Get the number of cached scripts.
    pub fn len(&self) -> usize {
        let cache = self.cache.read().unwrap();
        cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Global script cache shared by all module loads.
static GLOBAL_CACHE: std::sync::LazyLock<ScriptCache> = std::sync::LazyLock::new(ScriptCache::new);

/// Get the global script cache.
pub fn global_cache() -> &'static ScriptCache {
    &GLOBAL_CACHE
}
