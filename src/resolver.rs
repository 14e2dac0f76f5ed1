//! City name → airport code resolution, cache first

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheError, CodeCache};
use crate::data::ProviderError;

/// External call that turns a city name into a code
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Returns `Ok(None)` when the provider knows no code for `city`
    async fn lookup_code(&self, city: &str) -> Result<Option<String>, ProviderError>;
}

/// Errors that can occur while resolving a code
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Resolves city names to codes, consulting the code cache before the provider
#[derive(Debug, Clone)]
pub struct CodeResolver<L> {
    lookup: L,
    cache: CodeCache,
}

impl<L: LocationLookup> CodeResolver<L> {
    pub fn new(lookup: L, cache: CodeCache) -> Self {
        Self { lookup, cache }
    }

    /// Resolves `city` to a code
    ///
    /// # Returns
    /// * `Ok(Some(code))` from the cache, or from the provider (then cached)
    /// * `Ok(None)` if the provider has no code; nothing is cached
    /// * `Err(ResolveError)` if the cache or the provider call fails
    pub async fn resolve(&self, city: &str) -> Result<Option<String>, ResolveError> {
        if let Some(code) = self.cache.get(city)? {
            debug!(city, code = %code, "Code found in cache");
            return Ok(Some(code));
        }

        info!(city, "Looking up code");
        match self.lookup.lookup_code(city).await? {
            Some(code) => {
                self.cache.put(city, &code)?;
                Ok(Some(code))
            }
            None => {
                info!(city, "No code found");
                Ok(None)
            }
        }
    }
}
