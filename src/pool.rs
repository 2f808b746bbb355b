//! Core connection pool implementation

use crate::backoff::Backoff;
use crate::config::{Closer, Factory, PoolConfiguration, Prober};
use crate::errors::{ConfigError, PoolError, PoolResult};
use crate::idle::IdleConnection;

use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Point-in-time view of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections waiting in the idle buffer
    pub idle: usize,

    /// Connections created and not yet closed (checked out plus idle)
    pub open: usize,

    /// Maximum number of open connections
    pub max_size: usize,

    /// Whether the pool has been shut down
    pub closed: bool,
}

/// State mutated only while holding the pool's guard
struct Shared<T, E> {
    open_count: usize,
    factory: Option<Factory<T, E>>,
}

/// Thread-safe pool of reusable connections.
///
/// Idle connections live in a bounded lock-free queue. A single mutex owns
/// the open connection count; it is only held for bookkeeping, never while
/// a factory or closer runs. Nothing runs in the background: idle expiry and
/// probing happen lazily inside [`ConnectionPool::acquire`].
///
/// # Examples
///
/// ```
/// use general_pool::{ConnectionPool, PoolConfiguration, PoolError};
///
/// let config = PoolConfiguration::<u32, std::io::Error>::new()
///     .with_min_size(1)
///     .with_max_idle(1)
///     .with_max_size(1)
///     .with_factory(|| Ok(42))
///     .with_closer(|_| Ok(()));
///
/// let pool = ConnectionPool::new(config).unwrap();
/// assert_eq!(pool.size(), 1);
///
/// let conn = pool.acquire().unwrap();
/// assert!(matches!(pool.acquire(), Err(PoolError::MaxActiveReached)));
///
/// pool.release(conn).unwrap();
/// assert_eq!(pool.acquire().unwrap(), 42);
/// ```
pub struct ConnectionPool<T, E> {
    idle: Option<ArrayQueue<IdleConnection<T>>>,
    shared: Mutex<Shared<T, E>>,
    closed: AtomicBool,
    closer: Closer<T, E>,
    prober: Option<Prober<T, E>>,
    max_size: usize,
    idle_timeout: Option<Duration>,
    acquire_timeout: Duration,
    retry_backoff: Backoff,
}

impl<T, E> fmt::Debug for ConnectionPool<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("status", &self.status())
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl<T, E> ConnectionPool<T, E> {
    /// Number of idle connections right now; advisory under concurrency
    pub fn size(&self) -> usize {
        self.idle.as_ref().map_or(0, ArrayQueue::len)
    }

    /// Number of connections created and not yet closed
    pub fn open_count(&self) -> usize {
        self.shared.lock().open_count
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            idle: self.size(),
            open: self.open_count(),
            max_size: self.max_size,
            closed: self.is_closed(),
        }
    }

    fn pop_idle(&self) -> Option<IdleConnection<T>> {
        self.idle.as_ref().and_then(ArrayQueue::pop)
    }

    fn release_slot(&self) {
        let mut shared = self.shared.lock();
        shared.open_count = shared.open_count.saturating_sub(1);
    }
}

impl<T, E> ConnectionPool<T, E>
where
    T: Send,
    E: fmt::Display,
{
    /// Validate the configuration and create `min_size` connections.
    ///
    /// If the factory fails part way through, the connections created so
    /// far are closed and the factory error is returned as
    /// [`PoolError::Fill`].
    pub fn new(config: PoolConfiguration<T, E>) -> PoolResult<Self, E> {
        config.validate()?;

        let PoolConfiguration {
            min_size,
            max_size,
            max_idle,
            idle_timeout,
            fill_interval,
            acquire_timeout,
            retry_backoff,
            factory,
            closer,
            prober,
        } = config;
        let Some(factory) = factory else {
            return Err(ConfigError::MissingFactory.into());
        };
        let Some(closer) = closer else {
            return Err(ConfigError::MissingCloser.into());
        };

        let pool = Self {
            // ArrayQueue cannot have zero capacity; no buffer means every
            // release closes its connection.
            idle: (max_idle > 0).then(|| ArrayQueue::new(max_idle)),
            shared: Mutex::new(Shared {
                open_count: 0,
                factory: Some(factory.clone()),
            }),
            closed: AtomicBool::new(false),
            closer,
            prober,
            max_size,
            idle_timeout,
            acquire_timeout,
            retry_backoff,
        };

        for created in 0..min_size {
            if created > 0
                && let Some(interval) = fill_interval
            {
                std::thread::sleep(interval);
            }
            match factory() {
                Ok(resource) => {
                    pool.shared.lock().open_count += 1;
                    if let Err(surplus) = pool.push_idle(resource) {
                        // min_size <= max_idle, so this only happens if the
                        // buffer is missing entirely.
                        pool.close_quietly(surplus);
                    }
                }
                Err(e) => {
                    warn!(error = %e, created, "factory failed while filling pool");
                    pool.shutdown();
                    return Err(PoolError::Fill(e));
                }
            }
        }

        debug!(min_size, max_idle, max_size, "connection pool ready");
        Ok(pool)
    }

    /// Take a connection from the pool without waiting.
    ///
    /// Idle connections are preferred; expired ones and ones failing the
    /// probe are closed and skipped. With no idle connection left, a new
    /// one is created unless `max_size` connections are already open, in
    /// which case [`PoolError::MaxActiveReached`] is returned.
    pub fn acquire(&self) -> PoolResult<T, E> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        while let Some(idle) = self.pop_idle() {
            if idle.is_expired(self.idle_timeout) {
                debug!(idle_for = ?idle.returned_at.elapsed(), "closing expired idle connection");
                self.close_quietly(idle.resource);
                continue;
            }
            if let Some(prober) = &self.prober
                && let Err(e) = prober(&idle.resource)
            {
                debug!(error = %e, "closing idle connection that failed probe");
                self.close_quietly(idle.resource);
                continue;
            }
            return Ok(idle.resource);
        }

        let mut shared = self.shared.lock();
        let Some(factory) = shared.factory.clone() else {
            return Err(PoolError::Closed);
        };
        if shared.open_count >= self.max_size {
            trace!(open = shared.open_count, max_size = self.max_size, "pool exhausted");
            return Err(PoolError::MaxActiveReached);
        }
        // Reserve the slot before creating so concurrent callers cannot
        // overshoot max_size; the factory itself runs unlocked.
        shared.open_count += 1;
        drop(shared);

        let resource = match factory() {
            Ok(resource) => resource,
            Err(e) => {
                self.release_slot();
                return Err(PoolError::Resource(e));
            }
        };
        if self.is_closed() {
            // Shut down while dialing: nothing may be handed out now.
            self.close_quietly(resource);
            return Err(PoolError::Closed);
        }
        debug!("opened new connection");
        Ok(resource)
    }

    /// Like [`acquire`](Self::acquire), but retries with the configured
    /// backoff while the pool is exhausted, up to the acquire timeout.
    pub async fn acquire_async(&self) -> PoolResult<T, E> {
        let timeout = self.acquire_timeout;
        let mut backoff = self.retry_backoff.clone();

        tokio::time::timeout(timeout, async {
            loop {
                match self.acquire() {
                    Err(PoolError::MaxActiveReached) => backoff.sleep_async().await,
                    other => return other,
                }
            }
        })
        .await
        .map_err(|_| PoolError::Timeout(timeout))?
    }

    /// Hand a connection back for reuse.
    ///
    /// If the idle buffer is full the connection is closed instead; after
    /// shutdown it is always closed, and the closer's result is returned.
    pub fn release(&self, resource: T) -> PoolResult<(), E> {
        if self.is_closed() {
            return self.discard(resource);
        }

        match self.push_idle(resource) {
            Ok(()) => {
                // Pairs with shutdown storing `closed` before draining: a
                // push that lands after the drain is cleaned up here.
                if self.is_closed() {
                    self.drain_idle();
                }
                Ok(())
            }
            Err(surplus) => {
                trace!("idle buffer full, closing returned connection");
                self.discard(surplus)
            }
        }
    }

    /// Close a connection and stop counting it as open.
    ///
    /// Use this for connections found to be broken instead of releasing
    /// them.
    pub fn discard(&self, resource: T) -> PoolResult<(), E> {
        self.release_slot();
        (self.closer)(resource).map_err(PoolError::Resource)
    }

    /// Run the configured prober against a connection.
    ///
    /// Without a prober every connection passes.
    pub fn probe(&self, resource: &T) -> PoolResult<(), E> {
        match &self.prober {
            Some(prober) => prober(resource).map_err(PoolError::Resource),
            None => Ok(()),
        }
    }

    /// Close the pool and every idle connection it holds.
    ///
    /// Checked-out connections are closed as they are released. Calling
    /// this again has no effect.
    pub fn shutdown(&self) {
        {
            let mut shared = self.shared.lock();
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
            self.closed.store(true, Ordering::SeqCst);
            shared.factory = None;
        }

        let drained = self.drain_idle();
        info!(drained, "connection pool shut down");
    }

    fn push_idle(&self, resource: T) -> Result<(), T> {
        match &self.idle {
            Some(queue) => queue
                .push(IdleConnection::new(resource))
                .map_err(|rejected| rejected.resource),
            None => Err(resource),
        }
    }

    fn close_quietly(&self, resource: T) {
        if let Err(e) = self.discard(resource) {
            warn!(error = %e, "failed to close connection");
        }
    }

    fn drain_idle(&self) -> usize {
        let mut drained = 0;
        while let Some(idle) = self.pop_idle() {
            self.close_quietly(idle.resource);
            drained += 1;
        }
        drained
    }
}

impl<T, E> Drop for ConnectionPool<T, E> {
    fn drop(&mut self) {
        // Dropping must not leak idle connections; the closer runs for each.
        self.closed.store(true, Ordering::SeqCst);
        if let Some(queue) = self.idle.take() {
            while let Some(idle) = queue.pop() {
                // E carries no Display bound here, so only the failure is logged.
                if (self.closer)(idle.resource).is_err() {
                    warn!("failed to close idle connection while dropping pool");
                }
            }
        }
    }
}
