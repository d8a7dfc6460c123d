use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use hotelstat_parser::RawArchive;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::ArchiveSource;

/// Caller-owned memo of successful fetches, keyed by URL.
///
/// Nothing expires on its own; callers drop entries with [`invalidate`] or
/// [`clear`]. Failed fetches are never stored.
///
/// [`invalidate`]: ArchiveCache::invalidate
/// [`clear`]: ArchiveCache::clear
#[derive(Debug)]
pub struct ArchiveCache<S> {
    inner: S,
    entries: Mutex<HashMap<String, RawArchive>>,
}

impl<S: ArchiveSource> ArchiveCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries().contains_key(url)
    }

    /// Drops the cached archive for `url`, returning whether one was present.
    pub fn invalidate(&self, url: &str) -> bool {
        self.entries().remove(url).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RawArchive>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ArchiveSource> ArchiveSource for ArchiveCache<S> {
    fn fetch(&self, url: &str) -> Result<RawArchive, FetchError> {
        if let Some(hit) = self.entries().get(url) {
            debug!(url, "Archive cache hit");
            return Ok(hit.clone());
        }

        // lock is released while the inner source runs
        let archive = self.inner.fetch(url)?;
        self.entries().insert(url.to_string(), archive.clone());
        Ok(archive)
    }
}
