//! Translation of trade batches into destination commands

use crate::model::{Batch, TradeRecord};
use std::collections::HashSet;

/// Metric name for the price series
pub const METRIC_PRICE: &str = "price";
/// Metric name for the size series
pub const METRIC_SIZE: &str = "size";

/// Destination key layout: series keys and the symbol registry key
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
    registry_key: String,
}

impl KeySpace {
    /// Create a key space with the given series prefix and registry key
    pub fn new(prefix: impl Into<String>, registry_key: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            registry_key: registry_key.into(),
        }
    }

    /// Series key for one symbol and metric: `<prefix>:<symbol>:<metric>`
    pub fn series_key(&self, symbol: &str, metric: &str) -> String {
        format!("{}:{}:{}", self.prefix, symbol, metric)
    }

    /// Key of the global symbol registry set
    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }
}

/// One timestamped point destined for a series key
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub key: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Value as the source encoded it
    pub value: String,
    /// Label pairs attached to the series
    pub labels: Vec<(String, String)>,
}

/// Registration of a symbol into the global registry set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub key: String,
    pub symbol: String,
}

/// Everything one batch turns into: submitted as a single round trip
#[derive(Debug, Clone, Default)]
pub struct BatchPipeline {
    pub upserts: Vec<Upsert>,
    pub registrations: Vec<Registration>,
    /// Records that translated successfully
    pub records: usize,
}

impl BatchPipeline {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.registrations.is_empty()
    }
}

/// Translate a batch into upserts and symbol registrations
///
/// Each transferable record yields exactly two upserts (price and size),
/// in record order. Records missing a required field are skipped with a
/// warning and never fail the batch. Optional label fields are omitted
/// when absent. Each distinct symbol yields one registration, in
/// first-seen order.
pub fn translate_batch(batch: &Batch, keyspace: &KeySpace) -> BatchPipeline {
    let mut upserts = Vec::with_capacity(batch.len() * 2);
    let mut registrations = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut records = 0;

    for record in batch.records() {
        let (Some(symbol), Some(timestamp), Some(price), Some(size)) = (
            record.symbol(),
            record.timestamp_millis(),
            record.price(),
            record.size(),
        ) else {
            tracing::warn!(id = %record.id(), "skipping record with missing required fields");
            continue;
        };

        let labels = labels_for(record, symbol);

        upserts.push(Upsert {
            key: keyspace.series_key(symbol, METRIC_PRICE),
            timestamp,
            value: price.to_string(),
            labels: labels.clone(),
        });
        upserts.push(Upsert {
            key: keyspace.series_key(symbol, METRIC_SIZE),
            timestamp,
            value: size.to_string(),
            labels,
        });

        if seen.insert(symbol) {
            registrations.push(Registration {
                key: keyspace.registry_key().to_string(),
                symbol: symbol.to_string(),
            });
        }
        records += 1;
    }

    BatchPipeline {
        upserts,
        registrations,
        records,
    }
}

/// Label set for one record; optional fields are omitted when absent
fn labels_for(record: &TradeRecord, symbol: &str) -> Vec<(String, String)> {
    let mut labels = vec![
        ("type".to_string(), "trade".to_string()),
        ("symbol".to_string(), symbol.to_string()),
    ];
    if let Some(conditions) = record.conditions() {
        labels.push(("conditions".to_string(), conditions.to_string()));
    }
    if let Some(exchange) = record.exchange() {
        labels.push(("exchange".to_string(), exchange.to_string()));
    }
    if let Some(tape) = record.tape() {
        labels.push(("tape".to_string(), tape.to_string()));
    }
    labels
}
