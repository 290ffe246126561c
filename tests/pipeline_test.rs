//! End-to-end pipeline tests against in-memory source and sink fakes

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tick_relay::error::RelayError;
use tick_relay::model::{Batch, StreamId, TradeRecord};
use tick_relay::monitor::ThroughputCounter;
use tick_relay::sink::{BatchPipeline, KeySpace, SeriesSink, WriterPool};
use tick_relay::source::{StreamReader, TradeSource};
use tokio::sync::{mpsc, Mutex};

fn trade(id: &str, symbol: &str, ts: &str, price: &str, size: &str) -> TradeRecord {
    let fields: HashMap<String, String> = serde_json::from_value(serde_json::json!({
        "S": symbol,
        "t": ts,
        "p": price,
        "s": size,
    }))
    .unwrap();
    TradeRecord::new(StreamId::new(id), fields)
}

fn keyspace() -> KeySpace {
    KeySpace::new("trades", "symbols")
}

/// Source serving scripted reads in order, then blocking forever
struct MemorySource {
    reads: Vec<Vec<TradeRecord>>,
    next: usize,
}

impl MemorySource {
    fn new(reads: Vec<Vec<TradeRecord>>) -> Self {
        Self { reads, next: 0 }
    }
}

#[async_trait]
impl TradeSource for MemorySource {
    async fn read_after(
        &mut self,
        _cursor: &StreamId,
        _max: usize,
    ) -> Result<Vec<TradeRecord>, RelayError> {
        if self.next >= self.reads.len() {
            std::future::pending::<()>().await;
        }
        let records = self.reads[self.next].clone();
        self.next += 1;
        Ok(records)
    }
}

/// In-memory destination with first-write-wins upsert semantics
#[derive(Default)]
struct MemoryStore {
    series: HashMap<String, BTreeMap<i64, f64>>,
    registry: HashSet<String>,
}

impl MemoryStore {
    fn apply(&mut self, pipeline: &BatchPipeline) {
        for upsert in &pipeline.upserts {
            let value: f64 = upsert.value.parse().expect("numeric value");
            self.series
                .entry(upsert.key.clone())
                .or_default()
                .entry(upsert.timestamp)
                .or_insert(value);
        }
        for registration in &pipeline.registrations {
            self.registry.insert(registration.symbol.clone());
        }
    }

    fn point(&self, key: &str, ts: i64) -> Option<f64> {
        self.series.get(key).and_then(|s| s.get(&ts)).copied()
    }
}

#[derive(Default)]
struct MemorySink {
    store: Mutex<MemoryStore>,
    /// Submissions registering this symbol fail
    fail_symbol: Option<String>,
}

#[async_trait]
impl SeriesSink for MemorySink {
    async fn submit(&self, pipeline: BatchPipeline) -> Result<(), RelayError> {
        if let Some(fail) = &self.fail_symbol {
            if pipeline.registrations.iter().any(|r| &r.symbol == fail) {
                return Err(RelayError::SinkWrite("injected failure".into()));
            }
        }
        self.store.lock().await.apply(&pipeline);
        Ok(())
    }
}

async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_end_to_end_transfer() {
    let source = MemorySource::new(vec![vec![
        trade("1-0", "AAPL", "1", "100.0", "10"),
        trade("1-1", "AAPL", "2", "101.0", "5"),
    ]]);
    let sink = Arc::new(MemorySink::default());
    let counter = ThroughputCounter::new();

    let (tx, rx) = mpsc::channel(8);
    let rx = Arc::new(Mutex::new(rx));
    let pool = WriterPool::spawn(2, rx, sink.clone(), keyspace(), counter.clone());

    let reader = StreamReader::new(source, StreamId::earliest(), 100);
    let reader_handle = tokio::spawn(reader.run(tx));

    wait_for(|| counter.peek() == 2).await;
    reader_handle.abort();
    pool.join().await;

    let store = sink.store.lock().await;
    assert_eq!(store.point("trades:AAPL:price", 1), Some(100.0));
    assert_eq!(store.point("trades:AAPL:price", 2), Some(101.0));
    assert_eq!(store.point("trades:AAPL:size", 1), Some(10.0));
    assert_eq!(store.point("trades:AAPL:size", 2), Some(5.0));
    assert!(store.registry.contains("AAPL"));
}

#[tokio::test]
async fn test_worker_independence_with_preloaded_channel() {
    let sink = Arc::new(MemorySink::default());
    let counter = ThroughputCounter::new();

    // Pre-load three batches for disjoint symbol sets, then close the
    // channel so the pool drains and stops.
    let (tx, rx) = mpsc::channel(8);
    for (id, symbol) in [("1-0", "AAPL"), ("2-0", "MSFT"), ("3-0", "TSLA")] {
        let batch = Batch::new(vec![trade(id, symbol, "1", "50.0", "1")]).unwrap();
        tx.send(batch).await.unwrap();
    }
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));
    let pool = WriterPool::spawn(3, rx, sink.clone(), keyspace(), counter.clone());
    pool.join().await;

    let store = sink.store.lock().await;
    for symbol in ["AAPL", "MSFT", "TSLA"] {
        assert_eq!(
            store.point(&format!("trades:{}:price", symbol), 1),
            Some(50.0),
            "batch for {} was not applied",
            symbol
        );
        assert!(store.registry.contains(symbol));
    }
    assert_eq!(counter.take(), 3);
}

#[tokio::test]
async fn test_failure_isolation_between_batches() {
    let sink = Arc::new(MemorySink {
        store: Mutex::new(MemoryStore::default()),
        fail_symbol: Some("AAPL".to_string()),
    });
    let counter = ThroughputCounter::new();

    let (tx, rx) = mpsc::channel(8);
    tx.send(Batch::new(vec![trade("1-0", "AAPL", "1", "100.0", "10")]).unwrap())
        .await
        .unwrap();
    tx.send(Batch::new(vec![trade("2-0", "MSFT", "2", "330.0", "7")]).unwrap())
        .await
        .unwrap();
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));
    let pool = WriterPool::spawn(2, rx, sink.clone(), keyspace(), counter.clone());
    pool.join().await;

    let store = sink.store.lock().await;
    assert_eq!(store.point("trades:MSFT:price", 2), Some(330.0));
    assert_eq!(store.point("trades:AAPL:price", 1), None);
    assert_eq!(counter.take(), 1);
}

#[tokio::test]
async fn test_upsert_is_first_write_wins() {
    let sink = MemorySink::default();
    let ks = keyspace();

    let first = Batch::new(vec![trade("1-0", "AAPL", "5", "100.0", "10")]).unwrap();
    let pipeline = tick_relay::sink::translate_batch(&first, &ks);

    // Same pipeline twice: second submission is a no-op
    sink.submit(pipeline.clone()).await.unwrap();
    sink.submit(pipeline).await.unwrap();

    // Different value at the same timestamp: first value is retained
    let stale = Batch::new(vec![trade("1-1", "AAPL", "5", "999.0", "99")]).unwrap();
    sink.submit(tick_relay::sink::translate_batch(&stale, &ks))
        .await
        .unwrap();

    let store = sink.store.lock().await;
    assert_eq!(store.point("trades:AAPL:price", 5), Some(100.0));
    assert_eq!(store.point("trades:AAPL:size", 5), Some(10.0));
}

#[tokio::test]
async fn test_out_of_order_completion_still_applies_everything() {
    // A slow batch ahead of fast ones: with several workers the fast
    // batches can finish first, and nothing depends on completion order.
    let sink = Arc::new(MemorySink::default());
    let counter = ThroughputCounter::new();

    let (tx, rx) = mpsc::channel(8);
    let big: Vec<TradeRecord> = (0..50)
        .map(|i| trade(&format!("1-{}", i), "AAPL", &format!("{}", i + 1), "1.0", "1"))
        .collect();
    tx.send(Batch::new(big).unwrap()).await.unwrap();
    tx.send(Batch::new(vec![trade("2-0", "MSFT", "1", "2.0", "1")]).unwrap())
        .await
        .unwrap();
    drop(tx);

    let rx = Arc::new(Mutex::new(rx));
    let pool = WriterPool::spawn(2, rx, sink.clone(), keyspace(), counter.clone());
    pool.join().await;

    assert_eq!(counter.take(), 51);
    let store = sink.store.lock().await;
    assert_eq!(store.series.get("trades:AAPL:price").unwrap().len(), 50);
    assert_eq!(store.point("trades:MSFT:price", 1), Some(2.0));
}
