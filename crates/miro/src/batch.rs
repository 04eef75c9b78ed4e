//! Paced batch fan-out for bulk board operations.
//!
//! Bulk operations (e.g., re-syncing every project on a board) would
//! otherwise fire a burst of requests the instant the token bucket allows.
//! The batch queue partitions the work into small groups with a pause between
//! them, and reports a per-item fulfilled/rejected list instead of failing
//! the whole batch on the first error.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use log::debug;

/// Items per batch.
const DEFAULT_BATCH_SIZE: usize = 5;

/// Pause between batches.
const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Batch fan-out runner.
pub struct BatchQueue {
    batch_size: usize,
    pause: Duration,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pause: DEFAULT_BATCH_PAUSE,
        }
    }

    pub fn with_config(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
        }
    }

    /// Run `operation` over every item, in batches, pausing between batches.
    ///
    /// Items within one batch run concurrently; each item resolves to its own
    /// `Result`, so one rejection never poisons its batch. Results are
    /// returned in input order.
    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, operation: F) -> Vec<Result<T, E>>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut batches = items.into_iter().peekable();

        let mut index = 0;
        while batches.peek().is_some() {
            let batch: Vec<I> = batches.by_ref().take(self.batch_size).collect();
            debug!(
                "Running batch of {} ({}..{} of {})",
                batch.len(),
                index,
                index + batch.len(),
                total
            );
            index += batch.len();

            let outcomes = join_all(batch.into_iter().map(&operation)).await;
            results.extend(outcomes);

            if batches.peek().is_some() && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        results
    }
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiroError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn preserves_input_order_and_isolates_failures() {
        let queue = BatchQueue::with_config(2, Duration::ZERO);
        let items = vec![1u32, 2, 3, 4, 5];

        let results = queue
            .run(items, |n| async move {
                if n == 3 {
                    Err(MiroError::from_status(500, "boom"))
                } else {
                    Ok(n * 10)
                }
            })
            .await;

        assert_eq!(results.len(), 5);
        assert_eq!(*results[0].as_ref().unwrap(), 10);
        assert_eq!(*results[1].as_ref().unwrap(), 20);
        assert!(results[2].is_err());
        assert_eq!(*results[3].as_ref().unwrap(), 40);
        assert_eq!(*results[4].as_ref().unwrap(), 50);
    }

    #[tokio::test]
    async fn pauses_between_batches() {
        let queue = BatchQueue::with_config(2, Duration::from_millis(20));
        let start = Instant::now();

        let results = queue
            .run(vec![(); 6], |_| async { Ok::<_, MiroError>(()) })
            .await;

        assert_eq!(results.len(), 6);
        // Three batches, two pauses.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn runs_a_batch_concurrently() {
        let queue = BatchQueue::with_config(5, Duration::ZERO);
        let peak = AtomicUsize::new(0);
        let current = AtomicUsize::new(0);

        queue
            .run(vec![(); 5], |_| {
                let peak = &peak;
                let current = &current;
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, MiroError>(())
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn handles_empty_input() {
        let queue = BatchQueue::new();
        let results: Vec<Result<(), _>> =
            queue.run(Vec::<()>::new(), |_| async { Ok::<_, MiroError>(()) }).await;
        assert!(results.is_empty());
    }
}
