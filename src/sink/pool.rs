//! Writer pool: independent workers applying batches to the sink

use super::{translate_batch, KeySpace, SeriesSink};
use crate::model::Batch;
use crate::monitor::ThroughputCounter;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Receiver end of the transfer channel, shared by all workers
///
/// tokio's mpsc receiver is single-consumer; the mutex turns it into the
/// competing-consumer pop the pool needs. A worker holds the lock only
/// while waiting for its next batch.
pub type SharedBatchReceiver = Arc<Mutex<mpsc::Receiver<Batch>>>;

/// Pool of writer workers draining the transfer channel
///
/// Workers never coordinate with each other: two batches touching the
/// same symbol may be written concurrently, which is safe because the
/// sink's upsert is first-write-wins at a given timestamp. Completion
/// order across workers is unordered by design.
pub struct WriterPool {
    handles: Vec<JoinHandle<()>>,
}

impl WriterPool {
    /// Spawn `workers` writer tasks draining the shared receiver
    pub fn spawn(
        workers: usize,
        rx: SharedBatchReceiver,
        sink: Arc<dyn SeriesSink>,
        keyspace: KeySpace,
        counter: ThroughputCounter,
    ) -> Self {
        let handles = (0..workers)
            .map(|worker| {
                let rx = rx.clone();
                let sink = sink.clone();
                let keyspace = keyspace.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    Self::run_worker(worker, rx, sink, keyspace, counter).await;
                })
            })
            .collect();
        Self { handles }
    }

    /// One worker: pop, translate, submit, count
    ///
    /// A failed submit drops the batch and keeps the worker alive
    /// (best-effort delivery, no retry, no dead-letter).
    async fn run_worker(
        worker: usize,
        rx: SharedBatchReceiver,
        sink: Arc<dyn SeriesSink>,
        keyspace: KeySpace,
        counter: ThroughputCounter,
    ) {
        loop {
            let batch = { rx.lock().await.recv().await };
            let Some(batch) = batch else {
                tracing::info!(worker, "transfer channel closed, worker stopping");
                break;
            };

            let pipeline = translate_batch(&batch, &keyspace);
            if pipeline.is_empty() {
                continue;
            }

            let records = pipeline.records as u64;
            match sink.submit(pipeline).await {
                Ok(()) => counter.add(records),
                Err(e) => {
                    tracing::error!(
                        worker,
                        error = %e,
                        records = batch.len(),
                        "dropping batch after failed write"
                    );
                }
            }
        }
    }

    /// Number of workers in the pool
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to finish draining
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
