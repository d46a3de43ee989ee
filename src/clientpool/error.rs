//! Error types returned by the connection pool.
//!
//! Every fallible pool operation resolves to a [`PoolError`] so callers can
//! match on the failure mode instead of string-probing a boxed error.  Factory
//! construction failures keep their original error as the [`source`](std::error::Error::source)
//! of [`PoolError::ResourceCreation`].

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Failure modes surfaced by [`ConnectionPool`](crate::ConnectionPool) operations.
#[derive(Debug)]
pub enum PoolError {
    /// The factory failed while constructing a new connection.  No capacity
    /// slot is consumed by a failed create; the pool never retries on its own.
    ResourceCreation(Box<dyn Error + Send + Sync>),
    /// The operation ran against a pool that has been shut down, or the caller
    /// was waiting for capacity when the pool shut down.
    PoolClosed,
    /// A borrow with a deadline expired before a connection became available.
    /// Carries the timeout that elapsed.
    BorrowTimeout(Duration),
    /// Invalid construction parameters, e.g. a zero maximum pool size.
    Config(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::ResourceCreation(err) => {
                write!(f, "failed to create a pooled connection: {}", err)
            }
            PoolError::PoolClosed => write!(f, "the connection pool has been shut down"),
            PoolError::BorrowTimeout(timeout) => write!(
                f,
                "timed out after {:?} waiting for a pooled connection",
                timeout
            ),
            PoolError::Config(msg) => write!(f, "invalid pool configuration: {}", msg),
        }
    }
}

impl Error for PoolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PoolError::ResourceCreation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
