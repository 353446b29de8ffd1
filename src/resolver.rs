//! Category name resolution.
//!
//! [`CategoryNameResolver`] is the contract the card consumes. [`CategoryFile`]
//! reads names from disk on every call and [`CachedResolver`] memoizes any
//! resolver by category id.

use crate::error::ResolutionError;
use crate::store::parse_json;
use crate::task::CategoryId;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

#[async_trait]
pub trait CategoryNameResolver: Send + Sync {
    /// Resolves `id` to a human-readable name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotFound`] for unknown ids and
    /// [`ResolutionError::Transport`] when the backing store is unreachable.
    async fn resolve(&self, id: &CategoryId) -> Result<String, ResolutionError>;
}

/// Resolver backed by a JSON object of `{ "<id>": "<name>" }`.
#[derive(Debug, Clone)]
pub struct CategoryFile {
    path: PathBuf,
    latency: Duration,
}

impl CategoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latency: Duration::ZERO,
        }
    }

    /// Delays every lookup, to mimic a remote category service.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<CategoryId, String>, ResolutionError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| ResolutionError::Transport(format!("{}: {err}", self.path.display())))?;
        parse_json(&self.path, &data).map_err(|err| ResolutionError::Transport(err.to_string()))
    }
}

#[async_trait]
impl CategoryNameResolver for CategoryFile {
    async fn resolve(&self, id: &CategoryId) -> Result<String, ResolutionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut names = self.load().await?;
        debug!(category = %id, path = %self.path.display(), "read category file");
        names
            .remove(id)
            .ok_or_else(|| ResolutionError::NotFound(id.clone()))
    }
}

/// Memoizes successful resolutions; failures are retried by the next caller.
///
/// Concurrent lookups of the same id share a single call to the inner
/// resolver.
pub struct CachedResolver<R> {
    inner: R,
    cache: Cache<CategoryId, String>,
}

impl<R: CategoryNameResolver> CachedResolver<R> {
    pub fn new(inner: R, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }
}

#[async_trait]
impl<R: CategoryNameResolver> CategoryNameResolver for CachedResolver<R> {
    async fn resolve(&self, id: &CategoryId) -> Result<String, ResolutionError> {
        trace!(category = %id, "resolving through cache");
        self.cache
            .try_get_with(id.clone(), self.inner.resolve(id))
            .await
            .map_err(|err| (*err).clone())
    }
}
