//! A [`ConnectionFactory`] that builds `reqwest::Client` instances tuned for
//! persistent connections.
//!
//! Each client is configured to avoid DNS/TLS churn and reconnection
//! overhead:
//!
//! - connection pooling with idle connections kept per host
//! - a 90-second idle timeout for persistent connections
//! - TCP keepalive probes to maintain long-lived connections
//! - a 30-second connection timeout
//!
//! The factory itself does no I/O at construction; the client is built when
//! the pool asks for one.  HTTP semantics (retries, redirects, TLS) belong to
//! the built client, not to the pool.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use clientpool::{ConnectionPool, HttpClientFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = HttpClientFactory::new("https://api.openai.com/v1")
//!         .with_request_timeout(Duration::from_secs(300));
//!     let pool = ConnectionPool::new(factory, 4)?;
//!
//!     let conn = pool.borrow().await?;
//!     let response = conn.resource().get("https://api.openai.com/v1/models").send().await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;

use crate::clientpool::factory::ConnectionFactory;

/// Builds `reqwest::Client`s with connection-reuse friendly settings.
///
/// The base URL identifies which endpoint this factory's clients are meant
/// for (pools are typically kept per base URL, see
/// [`registry`](crate::clientpool::registry)); it is not baked into the built
/// client.
pub struct HttpClientFactory {
    base_url: String,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    tcp_keepalive: Duration,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl HttpClientFactory {
    /// Create a factory for the given base URL with the default tuning:
    /// 10 idle connections per host, 90s idle timeout, 60s TCP keepalive,
    /// 30s connect timeout, no overall request timeout.
    pub fn new(base_url: &str) -> Self {
        HttpClientFactory {
            base_url: base_url.to_string(),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
        }
    }

    /// Override how many idle connections each host keeps warm.
    pub fn with_pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a deadline for entire requests issued by the built clients.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The base URL this factory's clients are intended for.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ConnectionFactory for HttpClientFactory {
    type Connection = reqwest::Client;

    async fn create(&self) -> Result<reqwest::Client, Box<dyn Error + Send + Sync>> {
        let mut builder = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(Some(self.pool_idle_timeout))
            .tcp_keepalive(Some(self.tcp_keepalive))
            .connect_timeout(self.connect_timeout);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|err| {
            log::error!(
                "clientpool::http_factory: failed to build HTTP client for {}: {}",
                self.base_url,
                err
            );
            Box::new(err) as Box<dyn Error + Send + Sync>
        })
    }
}
