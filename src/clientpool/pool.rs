//! The bounded connection pool core.
//!
//! [`ConnectionPool`] owns the idle set, the capacity bound, the factory, and
//! the optional lifecycle listener.  Borrowers receive a
//! [`PooledConnection`] handle that returns the connection on drop.
//!
//! The pool serializes all bookkeeping under one internal lock that is never
//! held across an `.await`, a factory call, or a listener callback.  Waiting
//! for capacity rides on a fair [`tokio::sync::Semaphore`]: waiters queue in
//! FIFO order, a timed-out waiter deregisters itself, and shutdown wakes every
//! waiter with [`PoolError::PoolClosed`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use clientpool::{ConnectionFactory, ConnectionPool};
//!
//! struct TicketFactory;
//!
//! #[async_trait]
//! impl ConnectionFactory for TicketFactory {
//!     type Connection = u64;
//!
//!     async fn create(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
//!         Ok(42)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ConnectionPool::new(TicketFactory, 2)?;
//!
//!     let conn = pool.borrow().await?;
//!     assert_eq!(*conn.resource(), 42);
//!     drop(conn); // back to the idle set
//!
//!     assert_eq!(pool.status().available_connections, 1);
//!     pool.shutdown();
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::clientpool::error::PoolError;
use crate::clientpool::factory::ConnectionFactory;
use crate::clientpool::handle::{Entry, PooledConnection};
use crate::clientpool::listener::PoolListener;
use crate::clientpool::status::PoolStatus;

/// Tuning knobs for a [`ConnectionPool`].
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of live connections (borrowed + idle).  Must be at
    /// least 1.
    pub max_size: usize,
    /// Connections older than this are destroyed instead of reused, both at
    /// borrow time and by [`ConnectionPool::evict_expired`].  `None` disables
    /// age checks entirely.
    pub max_connection_age: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_size: 10,
            max_connection_age: None,
        }
    }
}

/// Mutable pool state.  Only ever touched under the [`PoolShared::state`]
/// lock, and only for straight-line code.
struct PoolState<C> {
    /// Valid, currently-unused connections.  FIFO: borrow pops the front,
    /// return pushes the back, so connection age spreads evenly and stale
    /// connections surface sooner.
    idle: VecDeque<Entry<C>>,
    /// Connections currently held by callers.
    borrowed: usize,
    /// Set once by `shutdown()`; never unset.
    closed: bool,
}

/// State shared between the pool front, its clones, and the handles it has
/// issued (which hold it weakly).
pub(crate) struct PoolShared<F: ConnectionFactory> {
    factory: F,
    config: PoolConfig,
    /// Capacity bound.  One permit per live-connection slot; a handle carries
    /// its permit and surrenders it on release.
    semaphore: Arc<Semaphore>,
    state: Mutex<PoolState<F::Connection>>,
    listener: Option<Arc<dyn PoolListener>>,
}

impl<F: ConnectionFactory> PoolShared<F> {
    fn notify(&self, f: impl FnOnce(&dyn PoolListener)) {
        if let Some(listener) = &self.listener {
            f(listener.as_ref());
        }
    }

    /// Close and drop a connection, firing the destroy event.
    ///
    /// Close errors are logged and swallowed: destruction runs on cleanup
    /// paths where the caller has already moved on.  Never call this while
    /// holding the state lock.
    fn destroy_entry(&self, mut entry: Entry<F::Connection>, reason: &str) {
        let info = entry.info();
        if let Err(err) = self.factory.close(&mut entry.conn) {
            log::warn!(
                "clientpool::pool: error closing connection {}: {}",
                info.id,
                err
            );
        }
        drop(entry);
        log::debug!(
            "clientpool::pool: destroyed connection {} ({})",
            info.id,
            reason
        );
        self.notify(|listener| listener.on_connection_destroyed(&info, reason));
    }

    /// Take back a borrowed connection.  Invoked by the handle's release path
    /// (explicit or on drop).
    ///
    /// The capacity permit is surrendered only after the entry is parked in
    /// the idle set or destroyed, so a woken waiter always observes the
    /// completed transition.
    pub(crate) fn return_connection(
        &self,
        entry: Entry<F::Connection>,
        valid: bool,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        let mut state = self.state.lock().unwrap();
        state.borrowed -= 1;
        if state.closed {
            drop(state);
            self.destroy_entry(entry, "pool closed");
        } else if !valid {
            drop(state);
            self.destroy_entry(entry, "invalidated by caller");
        } else {
            let info = entry.info();
            state.idle.push_back(entry);
            drop(state);
            self.notify(|listener| listener.on_connection_returned(&info));
        }
        // Frees the slot and wakes the longest-waiting borrower, if any.
        drop(permit);
    }
}

/// A bounded pool of reusable client connections.
///
/// The pool is created with a [`ConnectionFactory`], a maximum size, and an
/// optional [`PoolListener`].  Connections are created lazily: the first
/// borrow that finds no idle connection while the pool is under capacity
/// invokes the factory.  At capacity, borrowers wait (FIFO) until a
/// connection is returned or the pool shuts down.
///
/// Cloning the pool is cheap and produces another front over the same shared
/// state, which is how the pool is passed to concurrent tasks.
pub struct ConnectionPool<F: ConnectionFactory> {
    shared: Arc<PoolShared<F>>,
}

impl<F: ConnectionFactory> Clone for ConnectionPool<F> {
    fn clone(&self) -> Self {
        ConnectionPool {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Create a pool bounded at `max_size` live connections.
    pub fn new(factory: F, max_size: usize) -> Result<Self, PoolError> {
        Self::new_with_config_and_listener(
            factory,
            PoolConfig {
                max_size,
                ..PoolConfig::default()
            },
            None,
        )
    }

    /// Variant of [`ConnectionPool::new`] that registers a lifecycle listener.
    pub fn new_with_listener(
        factory: F,
        max_size: usize,
        listener: Arc<dyn PoolListener>,
    ) -> Result<Self, PoolError> {
        Self::new_with_config_and_listener(
            factory,
            PoolConfig {
                max_size,
                ..PoolConfig::default()
            },
            Some(listener),
        )
    }

    /// Variant of [`ConnectionPool::new`] that takes a full [`PoolConfig`].
    pub fn new_with_config(factory: F, config: PoolConfig) -> Result<Self, PoolError> {
        Self::new_with_config_and_listener(factory, config, None)
    }

    /// Create a pool from a full [`PoolConfig`] and an optional listener.
    ///
    /// Fails with [`PoolError::Config`] if `config.max_size` is zero.
    pub fn new_with_config_and_listener(
        factory: F,
        config: PoolConfig,
        listener: Option<Arc<dyn PoolListener>>,
    ) -> Result<Self, PoolError> {
        if config.max_size == 0 {
            return Err(PoolError::Config(
                "max_size must be a positive integer".to_string(),
            ));
        }
        Ok(ConnectionPool {
            shared: Arc::new(PoolShared {
                semaphore: Arc::new(Semaphore::new(config.max_size)),
                state: Mutex::new(PoolState {
                    idle: VecDeque::with_capacity(config.max_size),
                    borrowed: 0,
                    closed: false,
                }),
                factory,
                config,
                listener,
            }),
        })
    }

    /// Borrow a connection, waiting as long as it takes for capacity.
    ///
    /// Reuses the oldest idle connection when one is available; otherwise
    /// creates a new one through the factory.  Waiting callers are served in
    /// FIFO order and are woken with [`PoolError::PoolClosed`] if the pool
    /// shuts down first.
    pub async fn borrow(&self) -> Result<PooledConnection<F>, PoolError> {
        let permit = self
            .shared
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::PoolClosed)?;
        self.borrow_with_permit(permit).await
    }

    /// Borrow a connection, giving up after `timeout`.
    ///
    /// Returns [`PoolError::BorrowTimeout`] if no connection became available
    /// within the window.  A timed-out waiter leaves no registration behind:
    /// dropping the wait also removes it from the capacity queue.
    pub async fn borrow_timeout(
        &self,
        timeout: Duration,
    ) -> Result<PooledConnection<F>, PoolError> {
        let acquire = self.shared.semaphore.clone().acquire_owned();
        let permit = match tokio::time::timeout(timeout, acquire).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::PoolClosed),
            Err(_) => return Err(PoolError::BorrowTimeout(timeout)),
        };
        self.borrow_with_permit(permit).await
    }

    /// Complete a borrow once a capacity permit is held: reuse an idle
    /// connection, or create a fresh one.
    async fn borrow_with_permit(
        &self,
        permit: OwnedSemaphorePermit,
    ) -> Result<PooledConnection<F>, PoolError> {
        let shared = &self.shared;
        let max_age = shared.config.max_connection_age;

        let (reused, expired) = {
            let mut state = shared.state.lock().unwrap();
            if state.closed {
                // Shutdown raced the permit acquisition.
                return Err(PoolError::PoolClosed);
            }
            let mut expired = Vec::new();
            let mut reused = None;
            while let Some(entry) = state.idle.pop_front() {
                if entry.is_expired(max_age) {
                    expired.push(entry);
                    continue;
                }
                reused = Some(entry);
                break;
            }
            if reused.is_some() {
                state.borrowed += 1;
            }
            (reused, expired)
        };

        for entry in expired {
            shared.destroy_entry(entry, "exceeded max connection age");
        }

        if let Some(entry) = reused {
            let info = entry.info();
            shared.notify(|listener| listener.on_connection_borrowed(&info));
            return Ok(PooledConnection::new(
                entry,
                permit,
                Arc::downgrade(shared),
            ));
        }

        // Idle set exhausted and we hold a free slot: ask the factory for a
        // new connection.  On failure the permit drops with the error, so the
        // slot is freed and no phantom capacity is consumed.
        let conn = shared
            .factory
            .create()
            .await
            .map_err(PoolError::ResourceCreation)?;
        let entry = Entry::new(conn);
        let info = entry.info();

        {
            let mut state = shared.state.lock().unwrap();
            if state.closed {
                // Shutdown raced the factory call; the newcomer never joins.
                drop(state);
                shared.destroy_entry(entry, "pool shutdown");
                return Err(PoolError::PoolClosed);
            }
            state.borrowed += 1;
        }

        log::debug!("clientpool::pool: created connection {}", info.id);
        shared.notify(|listener| listener.on_connection_created(&info));
        shared.notify(|listener| listener.on_connection_borrowed(&info));
        Ok(PooledConnection::new(entry, permit, Arc::downgrade(shared)))
    }

    /// Consistent snapshot of the pool counters.
    pub fn status(&self) -> PoolStatus {
        let state = self.shared.state.lock().unwrap();
        PoolStatus {
            active_connections: state.borrowed,
            available_connections: state.idle.len(),
            pool_size: state.borrowed + state.idle.len(),
            max_size: self.shared.config.max_size,
        }
    }

    /// Whether [`shutdown`](ConnectionPool::shutdown) has run.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().unwrap().closed
    }

    /// Shut the pool down.  Idempotent.
    ///
    /// Destroys every idle connection immediately and wakes all waiting
    /// borrowers with [`PoolError::PoolClosed`].  Connections still borrowed
    /// are destroyed lazily when their holders release them.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.shared.state.lock().unwrap();
            if state.closed {
                return;
            }
            state.closed = true;
            mem::take(&mut state.idle)
        };
        self.shared.semaphore.close();
        log::debug!(
            "clientpool::pool: shutting down, draining {} idle connection(s)",
            drained.len()
        );
        for entry in drained {
            self.shared.destroy_entry(entry, "pool shutdown");
        }
    }

    /// Destroy every idle connection older than the configured
    /// [`max_connection_age`](PoolConfig::max_connection_age).
    ///
    /// Returns the number of connections destroyed.  A no-op (returning 0)
    /// when no age limit is configured.  The pool runs no background tasks;
    /// callers that want periodic eviction schedule this themselves.
    pub fn evict_expired(&self) -> usize {
        let max_age = match self.shared.config.max_connection_age {
            Some(age) => age,
            None => return 0,
        };
        let expired = {
            let mut state = self.shared.state.lock().unwrap();
            let mut keep = VecDeque::with_capacity(state.idle.len());
            let mut expired = Vec::new();
            while let Some(entry) = state.idle.pop_front() {
                if entry.is_expired(Some(max_age)) {
                    expired.push(entry);
                } else {
                    keep.push_back(entry);
                }
            }
            state.idle = keep;
            expired
        };
        let count = expired.len();
        for entry in expired {
            self.shared.destroy_entry(entry, "exceeded max connection age");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullFactory;

    #[async_trait]
    impl ConnectionFactory for NullFactory {
        type Connection = ();

        async fn create(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    #[test]
    fn test_zero_max_size_is_rejected() {
        let err = ConnectionPool::new(NullFactory, 0).err().expect("must fail");
        match err {
            PoolError::Config(msg) => assert!(msg.contains("positive")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_size, 10);
        assert!(config.max_connection_age.is_none());
    }

    #[test]
    fn test_new_pool_starts_empty_and_open() {
        let pool = ConnectionPool::new(NullFactory, 3).expect("valid config");
        let status = pool.status();
        assert_eq!(status.active_connections, 0);
        assert_eq!(status.available_connections, 0);
        assert_eq!(status.pool_size, 0);
        assert_eq!(status.max_size, 3);
        assert!(!pool.is_closed());
    }
}
