use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use vitrine_types::models::Category;

/// Categories change rarely; one hour matches the original deployment.
pub const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Read-through cache for the category listing.
///
/// Within the TTL every read returns the cached snapshot verbatim, including
/// after categories were added or removed in storage — that staleness window
/// is a documented limitation, not a bug. Write paths that cannot tolerate it
/// can call [`CategoryCache::invalidate`]; the default ones do not.
///
/// Concurrent misses may race on population, but recomputing and overwriting
/// the slot with equivalent data is idempotent, so a plain mutex suffices.
pub struct CategoryCache {
    ttl: Duration,
    slot: Mutex<Option<CachedEntry>>,
}

struct CachedEntry {
    fetched_at: Instant,
    categories: Vec<Category>,
}

impl CategoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot, or calls `load` and caches its result.
    pub fn get_or_populate<F>(&self, load: F) -> Result<Vec<Category>>
    where
        F: FnOnce() -> Result<Vec<Category>>,
    {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| anyhow::anyhow!("cache lock poisoned: {}", e))?;

        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.categories.clone());
            }
            debug!("category cache expired, reloading");
        }

        let categories = load()?;
        *slot = Some(CachedEntry {
            fetched_at: Instant::now(),
            categories: categories.clone(),
        });
        Ok(categories)
    }

    /// Drops the snapshot so the next read hits storage.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn miss_populates_and_later_reads_skip_the_loader() {
        let cache = CategoryCache::new(Duration::from_secs(3600));

        let first = cache
            .get_or_populate(|| Ok(vec![category("A"), category("B")]))
            .unwrap();
        assert_eq!(first.len(), 2);

        let second = cache
            .get_or_populate(|| panic!("loader must not run on a warm cache"))
            .unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn snapshot_stays_stale_after_storage_changes() {
        let cache = CategoryCache::new(Duration::from_secs(3600));

        cache
            .get_or_populate(|| Ok(vec![category("A"), category("B")]))
            .unwrap();

        // Storage now only holds B, but reads within the TTL still see {A, B}.
        let cached = cache.get_or_populate(|| Ok(vec![category("B")])).unwrap();
        let names: Vec<&str> = cached.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn expired_entries_are_reloaded() {
        let cache = CategoryCache::new(Duration::ZERO);

        cache.get_or_populate(|| Ok(vec![category("A")])).unwrap();
        let reloaded = cache.get_or_populate(|| Ok(vec![category("B")])).unwrap();
        assert_eq!(reloaded[0].name, "B");
    }

    #[test]
    fn invalidate_forces_the_next_read_through() {
        let cache = CategoryCache::new(Duration::from_secs(3600));

        cache.get_or_populate(|| Ok(vec![category("A")])).unwrap();
        cache.invalidate();

        let reloaded = cache.get_or_populate(|| Ok(vec![category("B")])).unwrap();
        assert_eq!(reloaded[0].name, "B");
    }
}
