//! Idle bookkeeping for connections parked in the pool

use std::time::{Duration, Instant};

/// A connection sitting in the idle buffer, stamped with the moment it was
/// handed back.
#[derive(Debug)]
pub(crate) struct IdleConnection<T> {
    pub resource: T,
    pub returned_at: Instant,
}

impl<T> IdleConnection<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            returned_at: Instant::now(),
        }
    }

    /// `None` and a zero timeout both disable expiry.
    pub fn is_expired(&self, idle_timeout: Option<Duration>) -> bool {
        match idle_timeout {
            Some(timeout) if !timeout.is_zero() => self.returned_at.elapsed() >= timeout,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_timeout_never_expires() {
        let conn = IdleConnection {
            resource: 1,
            returned_at: Instant::now() - Duration::from_millis(500),
        };
        assert!(!conn.is_expired(None));
        assert!(!conn.is_expired(Some(Duration::ZERO)));
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let conn = IdleConnection {
            resource: 1,
            returned_at: Instant::now() - Duration::from_millis(50),
        };
        assert!(conn.is_expired(Some(Duration::from_millis(50))));
        assert!(!conn.is_expired(Some(Duration::from_secs(60))));
    }

    #[test]
    fn test_fresh_connection_is_not_expired() {
        let conn = IdleConnection::new("conn");
        assert!(!conn.is_expired(Some(Duration::from_secs(1))));
    }
}
