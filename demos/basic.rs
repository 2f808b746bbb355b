//! Basic usage examples for ConnectionPool

use general_pool::{Backoff, ConnectionPool, PoolConfiguration, PoolError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Session {
    id: usize,
}

fn main() {
    println!("=== general-pool - Basic Examples ===\n");

    // Example 1: Reuse and exhaustion
    reuse_and_exhaustion();

    // Example 2: Idle timeout
    idle_timeout();

    // Example 3: Retrying with backoff
    retry_with_backoff();
}

fn session_config() -> PoolConfiguration<Session, String> {
    let next_id = Arc::new(AtomicUsize::new(1));
    PoolConfiguration::new()
        .with_factory(move || {
            Ok(Session {
                id: next_id.fetch_add(1, Ordering::Relaxed),
            })
        })
        .with_closer(|session| {
            println!("   closing session {}", session.id);
            Ok(())
        })
}

fn reuse_and_exhaustion() {
    println!("1. Reuse and exhaustion:");
    let pool = ConnectionPool::new(session_config().with_min_size(1).with_max_idle(1).with_max_size(1)).unwrap();

    let session = pool.acquire().unwrap();
    println!("   Got session {}", session.id);

    match pool.acquire() {
        Err(PoolError::MaxActiveReached) => println!("   Second acquire: pool exhausted"),
        other => println!("   Second acquire: {:?}", other.map(|s| s.id)),
    }

    pool.release(session).unwrap();
    let session = pool.acquire().unwrap();
    println!("   Reused session {}\n", session.id);
    pool.release(session).unwrap();
}

fn idle_timeout() {
    println!("2. Idle timeout:");
    let pool = ConnectionPool::new(
        session_config()
            .with_min_size(1)
            .with_max_idle(1)
            .with_max_size(1)
            .with_idle_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(60));
    let session = pool.acquire().unwrap();
    println!("   Fresh session after expiry: {}\n", session.id);
    pool.release(session).unwrap();
    pool.shutdown();
}

fn retry_with_backoff() {
    println!("3. Retrying with backoff:");
    let pool = Arc::new(ConnectionPool::new(session_config().with_max_idle(1).with_max_size(1)).unwrap());

    let held = pool.acquire().unwrap();
    let returner = {
        let pool = Arc::clone(&pool);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            pool.release(held).unwrap();
        })
    };

    let mut backoff = Backoff::new()
        .with_base_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(100))
        .with_jitter(true);
    let session = loop {
        match pool.acquire() {
            Ok(session) => break session,
            Err(e) if e.is_retryable() => backoff.sleep(),
            Err(e) => panic!("unexpected error: {e}"),
        }
    };
    println!("   Got session {} after {} retries", session.id, backoff.attempts());

    returner.join().unwrap();
    pool.release(session).unwrap();
}
