//! Process-wide registry of HTTP-client pools, one per base URL.
//!
//! Most applications talk to a handful of endpoints and want exactly one pool
//! per endpoint, shared across the whole process.  This module maintains that
//! singleton map so callers don't have to thread pool handles through their
//! plumbing: ask for the pool by base URL and get a cheap clone of the shared
//! instance.
//!
//! The registry is lazily initialized on first access.  Pool configuration is
//! fixed by whichever caller registers the base URL first; later calls with a
//! different `max_size` receive the existing pool unchanged.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::clientpool::error::PoolError;
use crate::clientpool::http_factory::HttpClientFactory;
use crate::clientpool::pool::ConnectionPool;

lazy_static! {
    /// Global pool registry, keyed by base URL.
    static ref POOL_REGISTRY: Mutex<HashMap<String, ConnectionPool<HttpClientFactory>>> =
        Mutex::new(HashMap::new());
}

/// Get or create the shared pool for the given base URL.
///
/// The first call for a base URL creates a pool of `max_size` clients built
/// by an [`HttpClientFactory`] with default tuning; subsequent calls return a
/// clone of that same pool regardless of the `max_size` they pass.
pub fn pool_for_base_url(
    base_url: &str,
    max_size: usize,
) -> Result<ConnectionPool<HttpClientFactory>, PoolError> {
    let mut registry = POOL_REGISTRY.lock().unwrap();
    if let Some(pool) = registry.get(base_url) {
        return Ok(pool.clone());
    }
    let pool = ConnectionPool::new(HttpClientFactory::new(base_url), max_size)?;
    registry.insert(base_url.to_string(), pool.clone());
    log::debug!(
        "clientpool::registry: registered pool for {} (max_size {})",
        base_url,
        max_size
    );
    Ok(pool)
}

/// Shut down every registered pool and clear the registry.
///
/// Outstanding clones of the registered pools observe the shutdown (their
/// borrows fail with [`PoolError::PoolClosed`]); a later
/// [`pool_for_base_url`] call for the same base URL creates a fresh pool.
pub fn shutdown_all() {
    let mut registry = POOL_REGISTRY.lock().unwrap();
    for (base_url, pool) in registry.drain() {
        log::debug!("clientpool::registry: shutting down pool for {}", base_url);
        pool.shutdown();
    }
}
