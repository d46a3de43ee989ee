//! # ClientPool
//!
//! ClientPool is a bounded, observable pool of reusable network-client connections.  It
//! amortizes the cost of constructing heavyweight client objects (HTTP clients for LLM and
//! API tooling being the motivating case) by handing them out to concurrent callers,
//! tracking their validity, reclaiming them safely, and notifying observers of lifecycle
//! events.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Bounded borrowing**: [`ConnectionPool`] serves `borrow`/`return` requests from many
//!   concurrent tasks while never letting more than a configured number of live
//!   connections exist at once
//! * **Scoped acquisition**: [`PooledConnection`] returns its connection to the pool on
//!   drop, and [`release`](PooledConnection::release) is a safe no-op when called again
//! * **Validity tracking**: [`mark_invalid`](PooledConnection::mark_invalid) reports a
//!   broken connection mid-use; the pool destroys it at the release point instead of
//!   recycling it
//! * **Lifecycle observability**: [`PoolListener`] delivers created/borrowed/returned/
//!   destroyed callbacks without affecting pool correctness
//! * **Pluggable construction**: [`ConnectionFactory`] is the seam between the pool and
//!   whatever client object you pool; [`HttpClientFactory`] is the batteries-included
//!   `reqwest` implementation
//! * **Process-wide sharing**: [`clientpool::registry`](crate::clientpool::registry)
//!   maintains one shared pool per base URL
//!
//! ## Core Concepts
//!
//! ### Borrowing from a bounded pool
//!
//! A pool is created from a factory and a maximum size.  Connections are created lazily;
//! at capacity, borrowers wait in FIFO order until a connection is returned or the pool
//! shuts down:
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
//!         Ok(7)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ConnectionPool::new(TicketFactory, 2)?;
//!
//!     let conn = pool.borrow().await?;
//!     assert_eq!(*conn.resource(), 7);
//!     drop(conn); // back to the idle set, ready for the next borrower
//!
//!     assert_eq!(pool.status().pool_size, 1);
//!     pool.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ### Pooling HTTP clients
//!
//! [`HttpClientFactory`] builds `reqwest::Client`s tuned for persistent connections (idle
//! pooling, TCP keepalive, connect timeouts), so each borrowed client avoids DNS and TLS
//! churn:
//!
//! ```rust,no_run
//! use clientpool::{ConnectionPool, HttpClientFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ConnectionPool::new(HttpClientFactory::new("https://api.openai.com/v1"), 4)?;
//!
//!     let conn = pool.borrow().await?;
//!     let response = conn.resource()
//!         .get("https://api.openai.com/v1/models")
//!         .send()
//!         .await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ### Observing the pool
//!
//! Implement [`PoolListener`] (all methods default to no-ops) and register it at
//! construction to follow every lifecycle transition:
//!
//! ```rust
//! use std::sync::Arc;
//! use clientpool::{ConnectionInfo, PoolListener};
//!
//! struct PrintListener;
//!
//! impl PoolListener for PrintListener {
//!     fn on_connection_created(&self, info: &ConnectionInfo) {
//!         println!("created {}", info.id);
//!     }
//!     fn on_connection_destroyed(&self, info: &ConnectionInfo, reason: &str) {
//!         println!("destroyed {} ({})", info.id, reason);
//!     }
//! }
//!
//! let listener: Arc<dyn PoolListener> = Arc::new(PrintListener);
//! # let _ = listener;
//! ```
//!
//! Continue exploring the modules re-exported from the crate root for the full surface.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding ClientPool can
/// opt-in to simple `RUST_LOG` driven diagnostics without having to choose a specific
/// logging backend upfront.
///
/// ```rust
/// clientpool::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `clientpool` module.
pub mod clientpool;

// Re-exporting key items for easier external access.
pub use clientpool::error::PoolError;
pub use clientpool::factory::ConnectionFactory;
pub use clientpool::handle::PooledConnection;
pub use clientpool::http_factory::HttpClientFactory;
pub use clientpool::listener::{ConnectionInfo, PoolListener};
pub use clientpool::pool::{ConnectionPool, PoolConfig};
pub use clientpool::registry;
pub use clientpool::status::PoolStatus;
