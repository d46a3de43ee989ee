//! Listener tests: event ordering, destroy reasons, exactly-once semantics,
//! and re-entrancy from inside callbacks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clientpool::{
    ConnectionFactory, ConnectionInfo, ConnectionPool, PoolConfig, PoolListener,
};

struct NullFactory;

#[async_trait]
impl ConnectionFactory for NullFactory {
    type Connection = ();

    async fn create(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Records every event as a readable line, in firing order.
#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn count_with_prefix(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }

    fn push(&self, line: String) {
        self.events.lock().unwrap().push(line);
    }
}

impl PoolListener for RecordingListener {
    fn on_connection_created(&self, info: &ConnectionInfo) {
        self.push(format!("created {}", info.id));
    }

    fn on_connection_borrowed(&self, info: &ConnectionInfo) {
        self.push(format!("borrowed {}", info.id));
    }

    fn on_connection_returned(&self, info: &ConnectionInfo) {
        self.push(format!("returned {}", info.id));
    }

    fn on_connection_destroyed(&self, info: &ConnectionInfo, reason: &str) {
        self.push(format!("destroyed {} ({})", info.id, reason));
    }
}

#[tokio::test]
async fn test_events_fire_in_order_for_a_borrow_return_cycle() {
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();

    let conn = pool.borrow().await.unwrap();
    let id = conn.id();
    drop(conn);

    assert_eq!(
        listener.events(),
        vec![
            format!("created {}", id),
            format!("borrowed {}", id),
            format!("returned {}", id),
        ]
    );
}

#[tokio::test]
async fn test_recycled_borrow_fires_no_second_created_event() {
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();

    let conn = pool.borrow().await.unwrap();
    drop(conn);
    let conn = pool.borrow().await.unwrap();
    drop(conn);

    assert_eq!(listener.count_with_prefix("created"), 1);
    assert_eq!(listener.count_with_prefix("borrowed"), 2);
    assert_eq!(listener.count_with_prefix("returned"), 2);
    assert_eq!(listener.count_with_prefix("destroyed"), 0);
}

#[tokio::test]
async fn test_repeated_release_fires_exactly_one_returned_event() {
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();

    let mut conn = pool.borrow().await.unwrap();
    conn.release();
    conn.release();
    drop(conn);

    assert_eq!(listener.count_with_prefix("returned"), 1);
}

#[tokio::test]
async fn test_invalidated_connection_fires_exactly_one_destroy() {
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();

    let mut conn = pool.borrow().await.unwrap();
    let id = conn.id();
    conn.mark_invalid();
    conn.release();
    conn.release();
    drop(conn);

    let destroys: Vec<String> = listener
        .events()
        .into_iter()
        .filter(|event| event.starts_with("destroyed"))
        .collect();
    assert_eq!(
        destroys,
        vec![format!("destroyed {} (invalidated by caller)", id)]
    );
    assert_eq!(listener.count_with_prefix("returned"), 0);
}

#[tokio::test]
async fn test_destroy_reasons_cover_every_teardown_path() {
    // Reason: invalidated by caller.
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();
    let conn = pool.borrow().await.unwrap();
    conn.mark_invalid();
    drop(conn);
    assert_eq!(listener.count_with_prefix("destroyed"), 1);
    assert!(listener.events()[2].contains("(invalidated by caller)"));

    // Reason: pool shutdown (idle connections drained by shutdown).
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();
    let conn = pool.borrow().await.unwrap();
    drop(conn);
    pool.shutdown();
    assert!(listener.events().last().unwrap().contains("(pool shutdown)"));

    // Reason: pool closed (still borrowed when the pool shut down).
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();
    let conn = pool.borrow().await.unwrap();
    pool.shutdown();
    drop(conn);
    assert!(listener.events().last().unwrap().contains("(pool closed)"));

    // Reason: exceeded max connection age.
    let listener = Arc::new(RecordingListener::default());
    let pool = ConnectionPool::new_with_config_and_listener(
        NullFactory,
        PoolConfig {
            max_size: 2,
            max_connection_age: Some(Duration::from_millis(10)),
        },
        Some(listener.clone()),
    )
    .unwrap();
    let conn = pool.borrow().await.unwrap();
    drop(conn);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(pool.evict_expired(), 1);
    assert!(listener
        .events()
        .last()
        .unwrap()
        .contains("(exceeded max connection age)"));
}

/// A listener that calls back into the pool from inside a callback.  Events
/// are dispatched outside the pool's critical section, so this must not
/// deadlock.
#[derive(Default)]
struct ReentrantListener {
    pool: Mutex<Option<ConnectionPool<NullFactory>>>,
    observed_sizes: Mutex<Vec<usize>>,
}

impl PoolListener for ReentrantListener {
    fn on_connection_returned(&self, _info: &ConnectionInfo) {
        if let Some(pool) = self.pool.lock().unwrap().as_ref() {
            self.observed_sizes
                .lock()
                .unwrap()
                .push(pool.status().pool_size);
        }
    }
}

#[tokio::test]
async fn test_listener_may_reenter_the_pool_without_deadlock() {
    let listener = Arc::new(ReentrantListener::default());
    let pool = ConnectionPool::new_with_listener(NullFactory, 2, listener.clone()).unwrap();
    *listener.pool.lock().unwrap() = Some(pool.clone());

    let conn = pool.borrow().await.unwrap();
    drop(conn);

    let observed = listener.observed_sizes.lock().unwrap().clone();
    assert_eq!(observed, vec![1]);
}

/// A listener that overrides nothing still satisfies the trait and costs the
/// pool nothing.
struct Uninterested;

impl PoolListener for Uninterested {}

#[tokio::test]
async fn test_noop_listener_does_not_disturb_the_pool() {
    let pool = ConnectionPool::new_with_listener(NullFactory, 1, Arc::new(Uninterested)).unwrap();

    let conn = pool.borrow().await.unwrap();
    drop(conn);
    let conn = pool.borrow().await.unwrap();
    drop(conn);

    assert_eq!(pool.status().available_connections, 1);
    pool.shutdown();
}
