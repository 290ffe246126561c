//! Stream reader: converts the continuous source log into batches

use super::TradeSource;
use crate::error::RelayError;
use crate::model::{Batch, StreamId};
use tokio::sync::mpsc;

/// Reads runs of records from the source and emits them as batches
///
/// Owns the live cursor: after every read the cursor advances to the ID
/// of the last record read, so a read never re-delivers anything at or
/// before it. Batches are pushed into a bounded channel; a full channel
/// blocks the reader, which is the pipeline's backpressure mechanism.
pub struct StreamReader<S> {
    source: S,
    cursor: StreamId,
    max_records: usize,
}

impl<S: TradeSource> StreamReader<S> {
    /// Create a reader starting after the given cursor
    pub fn new(source: S, start: StreamId, max_records: usize) -> Self {
        Self {
            source,
            cursor: start,
            max_records,
        }
    }

    /// Current cursor position
    pub fn cursor(&self) -> &StreamId {
        &self.cursor
    }

    /// Block until the source yields records and build the next batch
    ///
    /// Empty reads are spurious wakeups: the reader loops without ever
    /// emitting an empty batch (the source blocks server-side, so this
    /// never becomes a busy loop).
    pub async fn next_batch(&mut self) -> Result<Batch, RelayError> {
        loop {
            let records = self.source.read_after(&self.cursor, self.max_records).await?;
            if let Some(last) = records.last() {
                self.cursor = last.id().clone();
            }
            if let Some(batch) = Batch::new(records) {
                return Ok(batch);
            }
        }
    }

    /// Run the read loop until the channel closes or a read fails
    ///
    /// A read failure is returned to the caller, which treats it as fatal.
    /// A closed channel means the writers are gone and the reader exits
    /// cleanly.
    pub async fn run(mut self, tx: mpsc::Sender<Batch>) -> Result<(), RelayError> {
        loop {
            let batch = self.next_batch().await?;
            tracing::debug!(records = batch.len(), cursor = %self.cursor, "read batch");
            if tx.send(batch).await.is_err() {
                tracing::info!("transfer channel closed, reader stopping");
                return Ok(());
            }
        }
    }
}
