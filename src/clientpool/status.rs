//! Aggregate pool counters for observability.

use serde::Serialize;

/// Immutable snapshot of the pool's aggregate counters.
///
/// Produced by [`ConnectionPool::status`](crate::ConnectionPool::status) under
/// the same synchronization as borrow/return, so the counters are always
/// mutually consistent: `pool_size == active_connections + available_connections`
/// and `pool_size <= max_size`.
///
/// Derives [`Serialize`] so embedders can ship snapshots to their metrics or
/// JSON endpoints as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Connections currently borrowed by callers.
    pub active_connections: usize,
    /// Valid connections currently idle in the pool.
    pub available_connections: usize,
    /// Total live connections (borrowed + idle); destroyed connections are
    /// excluded.
    pub pool_size: usize,
    /// The configured maximum number of live connections.
    pub max_size: usize,
}
