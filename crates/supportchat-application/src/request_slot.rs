//! Single-slot ownership of the webhook connection.
//!
//! At most one request is in flight at a time. Whoever holds the
//! [`RequestPermit`] owns the slot; dropping the permit frees it, whether
//! the request succeeded, failed or was cancelled.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Clone)]
pub struct RequestSlot {
    semaphore: Arc<Semaphore>,
}

/// Proof of owning the request slot.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct RequestPermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claims the slot if it is free.
    pub fn try_claim(&self) -> Option<RequestPermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(RequestPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Waits for the slot. Returns `None` once the slot has been closed.
    pub async fn claim(&self) -> Option<RequestPermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .ok()
            .map(|permit| RequestPermit { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Refuses every future claim and wakes pending waiters.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

impl Default for RequestSlot {
    fn default() -> Self {
        Self::new()
    }
}
