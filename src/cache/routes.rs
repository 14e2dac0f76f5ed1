//! Route cache: last known flight offer per origin/destination pair

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{CacheError, CacheManager};
use crate::data::FlightOffer;

/// Subdirectory of the cache root holding route files
const ROUTES_SUBDIR: &str = "flights";

/// Ordered origin/destination pair
///
/// Direction matters: `SYD → NRT` and `NRT → SYD` are separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: String,
    destination: String,
}

impl RouteKey {
    /// Builds a key from two codes, trimmed and upper-cased
    ///
    /// Both codes end up in a file name, so anything but ASCII letters and
    /// digits is rejected with `CacheError::InvalidKey`.
    pub fn new(origin: &str, destination: &str) -> Result<Self, CacheError> {
        Ok(Self {
            origin: route_code(origin)?,
            destination: route_code(destination)?,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// File stem used on disk, e.g. `SYD_NRT`
    fn file_key(&self) -> String {
        format!("{}_{}", self.origin, self.destination)
    }
}

/// Whether `code` can be part of a route key
pub fn is_route_code(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn route_code(code: &str) -> Result<String, CacheError> {
    if !is_route_code(code) {
        return Err(CacheError::InvalidKey(code.to_string()));
    }
    Ok(code.trim().to_ascii_uppercase())
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

/// Time-bounded cache of flight offers keyed by route
#[derive(Debug, Clone)]
pub struct RouteCache {
    store: CacheManager,
    freshness: Duration,
}

impl RouteCache {
    /// Creates a route cache under `cache_root/flights`
    pub fn new(cache_root: PathBuf, freshness: Duration) -> Self {
        Self {
            store: CacheManager::with_dir(cache_root.join(ROUTES_SUBDIR)),
            freshness,
        }
    }

    /// Returns the cached offer for `key` if it is still fresh
    pub fn get(&self, key: &RouteKey) -> Result<Option<FlightOffer>, CacheError> {
        self.get_at(key, Utc::now())
    }

    /// Returns the cached offer for `key` if it is fresh as seen at `now`
    ///
    /// Absent and expired entries both resolve to `None`; they are only told
    /// apart in the logs. Expired files are left on disk until overwritten.
    pub fn get_at(
        &self,
        key: &RouteKey,
        now: DateTime<Utc>,
    ) -> Result<Option<FlightOffer>, CacheError> {
        let Some(entry) = self.store.read::<FlightOffer>(&key.file_key())? else {
            debug!(route = %key, "No cached offer");
            return Ok(None);
        };

        if !entry.is_fresh(self.freshness, now) {
            info!(
                route = %key,
                age_hours = entry.age(now).num_hours(),
                "Cached offer expired"
            );
            return Ok(None);
        }

        info!(route = %key, "Using cached offer");
        Ok(Some(entry.data))
    }

    /// Stores `offer` for `key`, stamped with the current time
    pub fn put(&self, key: &RouteKey, offer: &FlightOffer) -> Result<(), CacheError> {
        self.put_at(key, offer, Utc::now())
    }

    /// Stores `offer` for `key`, stamped with `now`
    pub fn put_at(
        &self,
        key: &RouteKey,
        offer: &FlightOffer,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        self.store.write_at(&key.file_key(), offer, now)?;
        debug!(route = %key, "Saved offer to cache");
        Ok(())
    }

    /// Reads the raw record for `key`, ignoring freshness (for testing)
    #[cfg(test)]
    pub fn entry(&self, key: &RouteKey) -> Result<Option<super::CacheEntry<FlightOffer>>, CacheError> {
        self.store.read(&key.file_key())
    }
}
