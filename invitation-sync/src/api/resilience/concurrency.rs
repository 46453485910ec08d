//! Concurrency limiter implementation
//!
//! Provides a semaphore-based limiter that caps how many spreadsheet writes
//! are in flight at once during per-row link regeneration.

use super::config::ConcurrencyConfig;
use log::debug;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Semaphore-based concurrency limiter for controlling concurrent API requests
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent_requests: usize,
}

impl ConcurrencyLimiter {
    /// Create a new concurrency limiter with the given configuration
    pub fn new(config: ConcurrencyConfig) -> Self {
        let permits = config.max_concurrent_requests.clamp(1, Semaphore::MAX_PERMITS);

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            max_concurrent_requests: permits,
        }
    }

    /// Acquire a permit for making a request. Waits if at capacity.
    /// Returns an owned permit that releases automatically when dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        if self.semaphore.available_permits() == 0 {
            debug!(
                "Concurrency limiter: waiting for permit ({} in use)",
                self.max_concurrent_requests
            );
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");

        debug!(
            "Concurrency limiter: acquired permit ({}/{} in use)",
            self.max_concurrent_requests - self.semaphore.available_permits(),
            self.max_concurrent_requests
        );

        permit
    }

    /// Get the number of available permits (requests that can start immediately)
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn test_concurrency_limiter_max_permits() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(3));

        let _p1 = limiter.acquire().await;
        let _p2 = limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 1);

        let _p3 = limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 0);

        // at capacity, a fourth acquire does not complete
        let blocked = timeout(Duration::from_millis(20), limiter.acquire()).await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn test_concurrency_limiter_release() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(2));

        let p1 = limiter.acquire().await;
        let _p2 = limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 0);

        drop(p1);

        assert_eq!(limiter.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_limiter_acquire_waits() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(1));
        let limiter_clone = limiter.clone();

        let permit = limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 0);

        let handle = tokio::spawn(async move {
            let _permit = limiter_clone.acquire().await;
            true
        });

        // Give the spawned task time to start waiting
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        drop(permit);

        let result = timeout(Duration::from_millis(100), handle).await;
        assert!(matches!(result, Ok(Ok(true))));
        assert_eq!(limiter.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_permits() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(2));
        let other = limiter.clone();

        let _permit = other.acquire().await;
        assert_eq!(limiter.available_permits(), 1);
    }
}
