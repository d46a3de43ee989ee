//! Observability hooks for connection lifecycle events.
//!
//! Implement [`PoolListener`] to receive real-time notifications about:
//!
//! - **Creation**: a factory create completed and the connection joined the pool
//! - **Borrow**: a connection was handed to a caller
//! - **Return**: a connection went back to the idle set
//! - **Destruction**: a connection was torn down, with a human-readable reason
//!
//! All four methods have default no-op implementations, so you only override
//! what you care about.  The listener is registered at pool construction as an
//! `Arc<dyn PoolListener>` and is invoked strictly outside the pool's internal
//! critical section: a listener may call back into the pool (for example to
//! read [`status()`](crate::ConnectionPool::status)) without deadlocking.
//!
//! Listeners observe the pool; they cannot affect its correctness.
//!
//! # Example
//!
//! ```rust
//! use clientpool::{ConnectionInfo, PoolListener};
//!
//! struct LogListener;
//!
//! impl PoolListener for LogListener {
//!     fn on_connection_destroyed(&self, info: &ConnectionInfo, reason: &str) {
//!         println!("connection {} destroyed after {:?}: {}", info.id, info.age(), reason);
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Identity and metadata of a pooled connection, as carried by listener
/// events and log lines.
///
/// Events expose metadata rather than the connection object itself: while a
/// connection is borrowed its resource is exclusively owned by the borrower,
/// and the pool never shares it.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionInfo {
    /// Unique id assigned when the connection was created.
    pub id: Uuid,
    /// Instant the connection was created; immutable for the connection's
    /// whole life.
    pub created_at: Instant,
}

impl ConnectionInfo {
    /// Time elapsed since the connection was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Receiver for connection lifecycle events.
///
/// Every method defaults to a no-op; implementors override the subset they
/// are interested in.
pub trait PoolListener: Send + Sync {
    /// A new connection was created by the factory.
    fn on_connection_created(&self, _info: &ConnectionInfo) {}

    /// A connection was handed out to a caller.
    fn on_connection_borrowed(&self, _info: &ConnectionInfo) {}

    /// A connection was returned to the idle set.
    fn on_connection_returned(&self, _info: &ConnectionInfo) {}

    /// A connection was destroyed.  `reason` is a short human-readable
    /// explanation, e.g. `"invalidated by caller"` or `"pool shutdown"`.
    fn on_connection_destroyed(&self, _info: &ConnectionInfo, _reason: &str) {}
}
