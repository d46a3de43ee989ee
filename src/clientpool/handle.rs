//! The borrowed-connection handle and its release-exactly-once contract.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::sync::OwnedSemaphorePermit;
use uuid::Uuid;

use crate::clientpool::factory::ConnectionFactory;
use crate::clientpool::listener::ConnectionInfo;
use crate::clientpool::pool::PoolShared;

const RELEASED: &str = "pooled connection used after release";

/// One live connection plus the metadata the pool tracks for it.  Owned by a
/// [`PooledConnection`] while borrowed and by the pool's idle set while idle.
pub(crate) struct Entry<C> {
    pub(crate) conn: C,
    pub(crate) id: Uuid,
    pub(crate) created_at: Instant,
}

impl<C> Entry<C> {
    pub(crate) fn new(conn: C) -> Self {
        Entry {
            conn,
            id: Uuid::new_v4(),
            created_at: Instant::now(),
        }
    }

    pub(crate) fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            created_at: self.created_at,
        }
    }

    pub(crate) fn is_expired(&self, max_age: Option<Duration>) -> bool {
        match max_age {
            Some(age) => self.created_at.elapsed() > age,
            None => false,
        }
    }
}

/// A connection borrowed from a [`ConnectionPool`](crate::ConnectionPool).
///
/// The handle exclusively owns the underlying client object for as long as it
/// is held; access it through [`resource`](PooledConnection::resource) or the
/// `Deref`/`DerefMut` impls and use it directly; the pool never intercepts
/// usage.
///
/// Dropping the handle returns the connection to the pool, so any exit path
/// out of a scope releases it.  [`release`](PooledConnection::release) does the
/// same thing explicitly and is safe to call any number of times: the return
/// side effect happens exactly once no matter how release is triggered.
///
/// If the connection turned out to be broken mid-use, call
/// [`mark_invalid`](PooledConnection::mark_invalid) before releasing; the pool
/// will destroy it instead of recycling it.
///
/// The handle holds only a [`Weak`] reference to its pool, so it never keeps
/// the pool alive.  If the pool is gone by the time the handle is released, the
/// connection is simply dropped.
#[must_use]
pub struct PooledConnection<F: ConnectionFactory> {
    /// `Some` while the handle owns the connection; taken exactly once on the
    /// first release.
    entry: Option<Entry<F::Connection>>,
    /// Capacity permit; travels with the handle and is surrendered to the
    /// pool on release.
    permit: Option<OwnedSemaphorePermit>,
    /// Non-owning back-reference used only to return the connection.
    pool: Weak<PoolShared<F>>,
    /// Monotone one-way flag: starts true, never reverts once false.
    valid: AtomicBool,
}

impl<F: ConnectionFactory> PooledConnection<F> {
    pub(crate) fn new(
        entry: Entry<F::Connection>,
        permit: OwnedSemaphorePermit,
        pool: Weak<PoolShared<F>>,
    ) -> Self {
        PooledConnection {
            entry: Some(entry),
            permit: Some(permit),
            pool,
            valid: AtomicBool::new(true),
        }
    }

    /// The underlying client object.
    ///
    /// # Panics
    ///
    /// Panics if called after [`release`](PooledConnection::release); a
    /// released handle no longer owns a connection.
    pub fn resource(&self) -> &F::Connection {
        &self.entry.as_ref().expect(RELEASED).conn
    }

    /// Mutable access to the underlying client object.
    ///
    /// # Panics
    ///
    /// Panics if called after [`release`](PooledConnection::release).
    pub fn resource_mut(&mut self) -> &mut F::Connection {
        &mut self.entry.as_mut().expect(RELEASED).conn
    }

    /// Unique id of this connection, stable across borrows.
    pub fn id(&self) -> Uuid {
        self.entry.as_ref().expect(RELEASED).id
    }

    /// Instant this connection was created.
    pub fn created_at(&self) -> Instant {
        self.entry.as_ref().expect(RELEASED).created_at
    }

    /// Time elapsed since this connection was created.
    pub fn age(&self) -> Duration {
        self.created_at().elapsed()
    }

    /// Report this connection as broken.
    ///
    /// Idempotent and one-way: once invalid, the connection can never become
    /// valid again.  Invalidation only flips the flag; teardown is deferred
    /// to the release point, where it happens under the pool's serialization.
    pub fn mark_invalid(&self) {
        self.valid.store(false, Ordering::Release);
    }

    /// Whether the connection is still considered usable.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Return the connection to the pool.
    ///
    /// The first call hands the connection back (to the idle set, or to
    /// destruction if the handle was marked invalid or the pool has shut
    /// down); every subsequent call is a no-op.  Dropping the handle invokes
    /// the same path, so explicit release is optional.
    pub fn release(&mut self) {
        let entry = match self.entry.take() {
            Some(entry) => entry,
            None => return,
        };
        let permit = self.permit.take();
        let valid = self.valid.load(Ordering::Acquire);
        match self.pool.upgrade() {
            Some(pool) => pool.return_connection(entry, valid, permit),
            None => {
                // Pool already dropped; nothing to return into.
                log::debug!(
                    "clientpool::handle: pool gone before connection {} was released, dropping it",
                    entry.id
                );
            }
        }
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<F: ConnectionFactory> Deref for PooledConnection<F> {
    type Target = F::Connection;

    fn deref(&self) -> &Self::Target {
        self.resource()
    }
}

impl<F: ConnectionFactory> DerefMut for PooledConnection<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource_mut()
    }
}
