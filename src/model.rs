//! Core pipeline types: stream cursor, trade records, batches

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Symbol field of a trade record
pub const FIELD_SYMBOL: &str = "S";
/// Timestamp field of a trade record
pub const FIELD_TIMESTAMP: &str = "t";
/// Price field of a trade record
pub const FIELD_PRICE: &str = "p";
/// Size field of a trade record
pub const FIELD_SIZE: &str = "s";
/// Trade conditions field (optional)
pub const FIELD_CONDITIONS: &str = "c";
/// Exchange code field (optional)
pub const FIELD_EXCHANGE: &str = "x";
/// Tape code field (optional)
pub const FIELD_TAPE: &str = "z";

/// Position marker into the source stream
///
/// Wraps a Redis stream entry ID (`<millis>-<seq>`). Ordering follows the
/// stream's order: numeric on the millisecond part, then on the sequence
/// part, never lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// Create a cursor from a raw stream entry ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Cursor positioned before the first entry in the stream
    pub fn earliest() -> Self {
        Self("0".to_string())
    }

    /// Cursor positioned after the last entry currently in the stream
    pub fn latest() -> Self {
        Self("$".to_string())
    }

    /// Raw ID as passed on the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric sort key (millis, sequence)
    ///
    /// A bare millisecond ID sorts as sequence 0. The symbolic `$` cursor
    /// sorts after every concrete ID.
    fn sort_key(&self) -> (u64, u64) {
        if self.0 == "$" {
            return (u64::MAX, u64::MAX);
        }
        match self.0.split_once('-') {
            Some((ms, seq)) => (
                ms.parse().unwrap_or_default(),
                seq.parse().unwrap_or_default(),
            ),
            None => (self.0.parse().unwrap_or_default(), 0),
        }
    }
}

impl PartialOrd for StreamId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StreamId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One trade event read from the source stream
///
/// Field values are kept as the strings the source produced; typed
/// accessors give the pipeline's view onto them. Records missing required
/// fields are carried as-is and skipped at translation time.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    id: StreamId,
    fields: HashMap<String, String>,
}

impl TradeRecord {
    /// Create a record from its stream ID and raw field mapping
    pub fn new(id: StreamId, fields: HashMap<String, String>) -> Self {
        Self { id, fields }
    }

    /// Stream entry ID of this record
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Raw field lookup
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Trading symbol
    pub fn symbol(&self) -> Option<&str> {
        self.get(FIELD_SYMBOL)
    }

    /// Source-assigned timestamp, verbatim
    pub fn timestamp(&self) -> Option<&str> {
        self.get(FIELD_TIMESTAMP)
    }

    /// Trade price (string-encoded numeric)
    pub fn price(&self) -> Option<&str> {
        self.get(FIELD_PRICE)
    }

    /// Trade size (string-encoded numeric)
    pub fn size(&self) -> Option<&str> {
        self.get(FIELD_SIZE)
    }

    /// Trade conditions, if the source supplied them
    pub fn conditions(&self) -> Option<&str> {
        self.get(FIELD_CONDITIONS)
    }

    /// Exchange code, if the source supplied it
    pub fn exchange(&self) -> Option<&str> {
        self.get(FIELD_EXCHANGE)
    }

    /// Tape code, if the source supplied it
    pub fn tape(&self) -> Option<&str> {
        self.get(FIELD_TAPE)
    }

    /// Timestamp normalized to epoch milliseconds
    ///
    /// Accepts a plain epoch-milliseconds integer or an RFC 3339 string.
    pub fn timestamp_millis(&self) -> Option<i64> {
        let raw = self.timestamp()?;
        if let Ok(ms) = raw.parse::<i64>() {
            return Some(ms);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }
}

/// An ordered group of trade records moved through the pipeline as one unit
///
/// Non-empty by construction. Each batch is produced by the reader and
/// consumed by exactly one writer worker.
#[derive(Debug, Clone)]
pub struct Batch(Vec<TradeRecord>);

impl Batch {
    /// Build a batch, refusing an empty record set
    pub fn new(records: Vec<TradeRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self(records))
        }
    }

    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: batches are non-empty by construction
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in production order
    pub fn records(&self) -> &[TradeRecord] {
        &self.0
    }

    /// Stream ID of the last record in the batch
    pub fn last_id(&self) -> &StreamId {
        self.0
            .last()
            .expect("batch is non-empty by construction")
            .id()
    }
}
