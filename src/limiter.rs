use crate::types::{EvalError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many episodes may be in flight at once. A limit of 1 makes
/// the batch strictly sequential.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Suspends until a slot frees. The permit releases on drop, on every
    /// exit path of the guarded call.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EvalError::General("concurrency limiter closed".to_string()))
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
