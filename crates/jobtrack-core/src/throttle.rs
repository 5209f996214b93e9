//! Batched execution of rate-limited outbound work.
//!
//! External providers cap request rates, so large fan-outs (one fetch per
//! stale area, or one reconciliation per occupation code) run through the
//! [`Throttler`]: fixed-size concurrent batches with a fixed delay between
//! them. Units are futures resolving to `Option<T>` — a unit signals
//! failure by resolving `None` after handling its own errors, so nothing a
//! unit does can abort the batch.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use jobtrack_core::throttle::Throttler;
//!
//! # async fn run() {
//! let throttler = Throttler::new(10, Duration::from_millis(1000));
//! let units = (0..25).map(|i| async move { Some(i * 2) });
//! let results = throttler.execute(units.collect()).await;
//! assert_eq!(results.len(), 25);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

/// Executes a queue of asynchronous units in fixed-size concurrent batches.
///
/// Batch N+1 is dispatched only after every unit of batch N has settled
/// and `batch_delay` has elapsed. The delay is pure backoff — it is not
/// measured from batch completion times and does not adapt to them. No
/// unit-level timeout is imposed; a hung unit stalls its batch, so units
/// must bound their own I/O.
#[derive(Debug, Clone)]
pub struct Throttler {
    batch_size: usize,
    batch_delay: Duration,
}

impl Throttler {
    /// A batch size of 0 is clamped to 1.
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Number of batches needed for `n` units.
    pub fn batches_for(&self, n: usize) -> usize {
        n.div_ceil(self.batch_size)
    }

    /// Drain the queue, returning completed results in dispatch order.
    ///
    /// Units resolving `None` are dropped from the output. Within a batch
    /// the completion order is unspecified, but result slots follow
    /// dispatch order regardless of completion timing.
    pub async fn execute<T, F>(&self, units: Vec<F>) -> Vec<T>
    where
        F: Future<Output = Option<T>>,
    {
        let total = units.len();
        if total == 0 {
            return Vec::new();
        }

        tracing::debug!(
            total,
            batch_size = self.batch_size,
            delay_ms = self.batch_delay.as_millis() as u64,
            "Executing throttled batches"
        );

        let mut remaining = units;
        let mut results = Vec::with_capacity(total);
        let mut batch_no = 0usize;

        while !remaining.is_empty() {
            if batch_no > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            let tail = remaining.split_off(remaining.len().min(self.batch_size));
            let batch = std::mem::replace(&mut remaining, tail);
            batch_no += 1;

            tracing::debug!(batch = batch_no, units = batch.len(), "Dispatching batch");
            let settled = join_all(batch).await;
            results.extend(settled.into_iter().flatten());
        }

        tracing::debug!(
            total,
            completed = results.len(),
            dropped = total - results.len(),
            "Throttled execution finished"
        );
        results
    }
}
