//! Throughput monitoring
//!
//! A shared atomic counter incremented by the writer workers and sampled
//! once per interval. The sample-and-reset races with concurrent
//! increments, so an interval may undercount slightly; the figure is
//! observational only.

use crate::model::Batch;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Process-wide counter of records written since the last sample
#[derive(Debug, Clone, Default)]
pub struct ThroughputCounter(Arc<AtomicU64>);

impl ThroughputCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `n` more processed records
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Read the current count and reset it to zero
    pub fn take(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }

    /// Read without resetting
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Spawn the monitor task: one log line per interval
///
/// Reports records processed since the last tick and the transfer
/// channel's current depth. Holds a sender clone purely to probe depth;
/// it never sends.
pub fn spawn_monitor(
    counter: ThroughputCounter,
    channel: mpsc::Sender<Batch>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately; skip it so the first report
        // covers a full interval
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let processed = counter.take();
            let depth = channel.max_capacity() - channel.capacity();
            tracing::info!(events_per_sec = processed, queue_depth = depth, "throughput");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates_and_resets() {
        let counter = ThroughputCounter::new();
        counter.add(10);
        counter.add(5);
        assert_eq!(counter.peek(), 15);
        assert_eq!(counter.take(), 15);
        assert_eq!(counter.peek(), 0);
        assert_eq!(counter.take(), 0);
    }

    #[test]
    fn test_counter_clones_share_state() {
        let counter = ThroughputCounter::new();
        let other = counter.clone();
        counter.add(3);
        other.add(4);
        assert_eq!(counter.take(), 7);
        assert_eq!(other.peek(), 0);
    }

    #[tokio::test]
    async fn test_monitor_task_runs_and_aborts() {
        let counter = ThroughputCounter::new();
        let (tx, _rx) = mpsc::channel::<Batch>(4);
        let handle = spawn_monitor(counter.clone(), tx, Duration::from_millis(10));

        counter.add(2);
        tokio::time::sleep(Duration::from_millis(35)).await;
        // The monitor took the count at some tick
        assert_eq!(counter.peek(), 0);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
