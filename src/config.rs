//! Pool configuration options

use crate::backoff::Backoff;
use crate::errors::ConfigError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Creates a new connection
pub type Factory<T, E> = Arc<dyn Fn() -> Result<T, E> + Send + Sync>;

/// Permanently closes a connection
pub type Closer<T, E> = Arc<dyn Fn(T) -> Result<(), E> + Send + Sync>;

/// Checks that a connection is still usable
pub type Prober<T, E> = Arc<dyn Fn(&T) -> Result<(), E> + Send + Sync>;

/// Configuration for connection pool behavior
///
/// # Examples
///
/// ```
/// use general_pool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::<u32, std::io::Error>::new()
///     .with_min_size(1)
///     .with_max_idle(4)
///     .with_max_size(8)
///     .with_idle_timeout(Duration::from_secs(30))
///     .with_factory(|| Ok(7))
///     .with_closer(|_| Ok(()));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_size, 8);
/// ```
pub struct PoolConfiguration<T, E> {
    /// Connections created up front by the constructor
    pub min_size: usize,

    /// Maximum number of open connections (checked out plus idle)
    pub max_size: usize,

    /// Maximum number of idle connections kept for reuse
    pub max_idle: usize,

    /// Idle connections older than this are closed instead of handed out
    pub idle_timeout: Option<Duration>,

    /// Pause between the connections created up front
    pub fill_interval: Option<Duration>,

    /// Deadline for `acquire_async`
    pub acquire_timeout: Duration,

    /// Delay schedule `acquire_async` follows while the pool is exhausted
    pub retry_backoff: Backoff,

    pub factory: Option<Factory<T, E>>,
    pub closer: Option<Closer<T, E>>,
    pub prober: Option<Prober<T, E>>,
}

impl<T, E> Default for PoolConfiguration<T, E> {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: 10,
            max_idle: 10,
            idle_timeout: None,
            fill_interval: None,
            acquire_timeout: Duration::from_secs(30),
            retry_backoff: Backoff::new()
                .with_base_delay(Duration::from_millis(10))
                .with_max_delay(Duration::from_secs(1))
                .with_jitter(true),
            factory: None,
            closer: None,
            prober: None,
        }
    }
}

impl<T, E> Clone for PoolConfiguration<T, E> {
    fn clone(&self) -> Self {
        Self {
            min_size: self.min_size,
            max_size: self.max_size,
            max_idle: self.max_idle,
            idle_timeout: self.idle_timeout,
            fill_interval: self.fill_interval,
            acquire_timeout: self.acquire_timeout,
            retry_backoff: self.retry_backoff.clone(),
            factory: self.factory.clone(),
            closer: self.closer.clone(),
            prober: self.prober.clone(),
        }
    }
}

impl<T, E> fmt::Debug for PoolConfiguration<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("max_idle", &self.max_idle)
            .field("idle_timeout", &self.idle_timeout)
            .field("fill_interval", &self.fill_interval)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("factory", &self.factory.is_some())
            .field("closer", &self.closer.is_some())
            .field("prober", &self.prober.is_some())
            .finish()
    }
}

impl<T, E> PoolConfiguration<T, E> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of connections created up front
    pub fn with_min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum number of open connections
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the maximum number of idle connections
    pub fn with_max_idle(mut self, size: usize) -> Self {
        self.max_idle = size;
        self
    }

    /// Set the idle timeout; a zero duration disables expiry
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Pace the up-front connection creation
    pub fn with_fill_interval(mut self, interval: Duration) -> Self {
        self.fill_interval = Some(interval);
        self
    }

    /// Set the deadline for `acquire_async`
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the delay schedule `acquire_async` uses between attempts
    pub fn with_retry_backoff(mut self, backoff: Backoff) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn with_closer<F>(mut self, closer: F) -> Self
    where
        F: Fn(T) -> Result<(), E> + Send + Sync + 'static,
    {
        self.closer = Some(Arc::new(closer));
        self
    }

    /// Probe idle connections before handing them out
    pub fn with_prober<F>(mut self, prober: F) -> Self
    where
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
    {
        self.prober = Some(Arc::new(prober));
        self
    }

    /// Check the capacity bounds and required callbacks
    ///
    /// # Examples
    ///
    /// ```
    /// use general_pool::{ConfigError, PoolConfiguration};
    ///
    /// let config = PoolConfiguration::<u32, std::io::Error>::new()
    ///     .with_min_size(2)
    ///     .with_max_idle(1)
    ///     .with_max_size(4)
    ///     .with_factory(|| Ok(1))
    ///     .with_closer(|_| Ok(()));
    ///
    /// assert!(matches!(config.validate(), Err(ConfigError::InvalidCapacity { .. })));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_size <= self.max_idle && self.max_idle <= self.max_size) {
            return Err(ConfigError::InvalidCapacity {
                min_size: self.min_size,
                max_idle: self.max_idle,
                max_size: self.max_size,
            });
        }
        if self.factory.is_none() {
            return Err(ConfigError::MissingFactory);
        }
        if self.closer.is_none() {
            return Err(ConfigError::MissingCloser);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PoolConfiguration<u32, String> {
        PoolConfiguration::new()
            .with_factory(|| Ok(1))
            .with_closer(|_| Ok(()))
    }

    #[test]
    fn test_defaults_are_valid_once_callbacks_are_set() {
        let config = complete();
        assert_eq!(config.min_size, 0);
        assert_eq!(config.max_size, 10);
        assert_eq!(config.max_idle, 10);
        assert!(config.idle_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_idle_above_max_size_rejected() {
        let config = complete().with_max_idle(5).with_max_size(4);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCapacity {
                min_size: 0,
                max_idle: 5,
                max_size: 4
            })
        );
    }

    #[test]
    fn test_zero_sized_pool_is_valid() {
        let config = complete().with_max_idle(0).with_max_size(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_callbacks_rejected() {
        let no_factory = PoolConfiguration::<u32, String>::new().with_closer(|_| Ok(()));
        assert_eq!(no_factory.validate(), Err(ConfigError::MissingFactory));

        let no_closer = PoolConfiguration::<u32, String>::new().with_factory(|| Ok(1));
        assert_eq!(no_closer.validate(), Err(ConfigError::MissingCloser));
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let rendered = format!("{:?}", complete().with_prober(|_| Ok(())));
        assert!(rendered.contains("factory: true"));
        assert!(rendered.contains("prober: true"));
    }
}
