//! # general-pool
//!
//! Bounded, thread-safe pool of reusable connections (or any closable
//! resource produced by a factory).
//!
//! ## Features
//!
//! - Caps on total open connections and on idle connections
//! - Non-blocking acquire: exhaustion fails fast with `MaxActiveReached`
//! - Lazy idle-timeout eviction and optional liveness probing on acquire
//! - Graceful shutdown that closes every idle connection
//! - Exponential backoff with jitter for callers retrying after exhaustion
//!
//! ## Quick Start
//!
//! ```rust
//! use general_pool::{ConnectionPool, PoolConfiguration};
//!
//! let config = PoolConfiguration::<String, std::io::Error>::new()
//!     .with_max_idle(2)
//!     .with_max_size(4)
//!     .with_factory(|| Ok(String::from("conn")))
//!     .with_closer(|_| Ok(()));
//!
//! let pool = ConnectionPool::new(config).unwrap();
//! let conn = pool.acquire().unwrap();
//! println!("Got: {}", conn);
//! pool.release(conn).unwrap();
//! assert_eq!(pool.size(), 1);
//! ```

mod backoff;
mod config;
mod errors;
mod idle;
mod pool;

pub use backoff::Backoff;
pub use config::{Closer, Factory, PoolConfiguration, Prober};
pub use errors::{ConfigError, PoolError, PoolResult};
pub use pool::{ConnectionPool, PoolStatus};
