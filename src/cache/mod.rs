//! Cache module for storing lookups to disk
//!
//! Two cache domains are built on the shared `CacheManager`:
//! - the code map, a single file mapping normalized city names to airport
//!   codes, which never expires
//! - the route cache, one file per ordered origin/destination pair holding the
//!   last flight offer found, which goes stale after a freshness window
//!
//! A corrupt cache file is reported as `CacheError::Corrupt` rather than
//! treated as a miss.

mod codes;
mod manager;
mod routes;

pub use codes::CodeCache;
pub use manager::{default_cache_dir, CacheEntry, CacheError, CacheManager};
pub use routes::{is_route_code, RouteCache, RouteKey};
