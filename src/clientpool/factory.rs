//! The factory seam between the pool and the connections it manages.
//!
//! A [`ConnectionFactory`] knows how to construct one underlying client object
//! (an HTTP client, a database session, anything expensive enough to be worth
//! recycling).  The pool calls [`create`](ConnectionFactory::create) lazily
//! whenever a borrow finds no idle connection while the pool is under
//! capacity, and [`close`](ConnectionFactory::close) exactly once when a
//! connection is destroyed.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use clientpool::ConnectionFactory;
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
//! ```

use std::error::Error;

use async_trait::async_trait;

/// Creates and tears down the underlying client objects managed by a
/// [`ConnectionPool`](crate::ConnectionPool).
///
/// Implementations hold whatever configuration construction needs (endpoints,
/// credentials, timeouts) but no per-connection state; the pool owns the
/// lifecycle bookkeeping.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// The underlying client object handed to borrowers.
    type Connection: Send + 'static;

    /// Construct a new connection.
    ///
    /// Failures are surfaced to the borrowing caller as
    /// [`PoolError::ResourceCreation`](crate::PoolError::ResourceCreation);
    /// the pool does not retry and does not consume a capacity slot for a
    /// failed create.  Retry policy, if any, belongs to the caller.
    async fn create(&self) -> Result<Self::Connection, Box<dyn Error + Send + Sync>>;

    /// Tear down a connection that is being destroyed.
    ///
    /// Called exactly once per connection, right before the connection is
    /// dropped.  Errors returned here are logged and swallowed by the pool,
    /// since destruction happens on cleanup paths where propagating would
    /// mask the original failure.  The default implementation relies on the
    /// connection's own `Drop`.
    fn close(&self, _conn: &mut Self::Connection) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
