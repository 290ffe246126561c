//! Source stream module
//!
//! Pulls trade records from the source log and turns the continuous
//! stream into discrete batches

mod reader;
pub(crate) mod redis;

pub use reader::StreamReader;
pub use self::redis::RedisStreamSource;

use crate::error::RelayError;
use crate::model::{StreamId, TradeRecord};
use async_trait::async_trait;

/// Trait for trade stream sources
#[async_trait]
pub trait TradeSource: Send {
    /// Read up to `max` records appended after `cursor`
    ///
    /// Blocks until the source has something to deliver; an empty result
    /// is a spurious wakeup and the caller reads again. Returned records
    /// are ordered by stream ID.
    async fn read_after(
        &mut self,
        cursor: &StreamId,
        max: usize,
    ) -> Result<Vec<TradeRecord>, RelayError>;
}
