//! Destination sink module
//!
//! Translates batches into pipelined time-series upserts and applies
//! them through a pool of independent writer workers

mod commands;
mod pool;
mod redis;

pub use commands::{
    translate_batch, BatchPipeline, KeySpace, Registration, Upsert, METRIC_PRICE, METRIC_SIZE,
};
pub use pool::{SharedBatchReceiver, WriterPool};
pub use self::redis::RedisTimeSeriesSink;

use crate::error::RelayError;
use async_trait::async_trait;

/// Trait for destination stores accepting one pipelined batch write
#[async_trait]
pub trait SeriesSink: Send + Sync {
    /// Submit the whole pipeline as one network round trip
    ///
    /// Upserts carry first-write-wins semantics at a given timestamp, so
    /// resubmitting a pipeline (or two workers racing on the same series)
    /// never overwrites an existing point.
    async fn submit(&self, pipeline: BatchPipeline) -> Result<(), RelayError>;
}
