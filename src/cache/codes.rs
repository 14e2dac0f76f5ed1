//! Code map: city name → airport/city code, shared in one file, no expiry

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use super::{CacheEntry, CacheError, CacheManager};

/// File stem of the shared code map
const CODE_MAP_KEY: &str = "iata_codes";

type CodeMap = BTreeMap<String, CacheEntry<String>>;

/// Permanent cache of resolved codes keyed by normalized city name
#[derive(Debug, Clone)]
pub struct CodeCache {
    store: CacheManager,
}

impl CodeCache {
    /// Creates a code cache stored at `cache_root/iata_codes.json`
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            store: CacheManager::with_dir(cache_root),
        }
    }

    /// Lowercased, trimmed city name used as the map key
    pub fn normalize(city: &str) -> String {
        city.trim().to_lowercase()
    }

    /// Looks up the cached code for `city`
    pub fn get(&self, city: &str) -> Result<Option<String>, CacheError> {
        let map = self.load_map()?;
        Ok(map.get(&Self::normalize(city)).map(|entry| entry.data.clone()))
    }

    /// Records `code` for `city`, replacing any previous code
    pub fn put(&self, city: &str, code: &str) -> Result<(), CacheError> {
        self.put_at(city, code, Utc::now())
    }

    pub fn put_at(&self, city: &str, code: &str, now: DateTime<Utc>) -> Result<(), CacheError> {
        let key = Self::normalize(city);
        let mut map = self.load_map()?;
        map.insert(key.clone(), CacheEntry::new(key.as_str(), code.to_string(), now));
        self.store.store(CODE_MAP_KEY, &map)?;
        debug!(city = %key, code, "Saved code to cache");
        Ok(())
    }

    fn load_map(&self) -> Result<CodeMap, CacheError> {
        Ok(self.store.load(CODE_MAP_KEY)?.unwrap_or_default())
    }
}
