//! Bounded pool for concurrent downloads

use crate::limits::ResourceLimits;
use patron_errors::{CrawlError, Error};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps how many downloads of one crawl are in flight.
///
/// Clones share the same permits. Callers queue in FIFO order once the
/// pool is full.
#[derive(Debug, Clone)]
pub struct DownloadPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl DownloadPool {
    #[must_use]
    pub fn new(limits: &ResourceLimits) -> Self {
        let capacity = limits.concurrent_downloads.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free slot. The slot is returned when the permit drops.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::PoolClosed` once [`DownloadPool::close`] was called.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, Error> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CrawlError::PoolClosed.into())
    }

    /// Fail every pending and future [`DownloadPool::acquire`]
    pub fn close(&self) {
        self.permits.close();
    }
}
