//! Pipeline orchestration
//!
//! Wires the stream reader, the bounded transfer channel, the writer
//! pool, and the throughput monitor together and runs until a fatal
//! error or an interrupt.

use crate::config::Config;
use crate::model::Batch;
use crate::monitor::{spawn_monitor, ThroughputCounter};
use crate::sink::{KeySpace, RedisTimeSeriesSink, WriterPool};
use crate::source::{RedisStreamSource, StreamReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Interval between throughput reports
const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Run the transfer pipeline until the reader fails or an interrupt fires
///
/// Startup connectivity failures (source or sink) are fatal and surface
/// here. Shutdown on interrupt is abrupt: batches in the channel or in
/// flight at a worker may be lost, which the best-effort delivery model
/// accepts.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let source =
        RedisStreamSource::connect(&config.source.endpoint, config.source.stream.clone()).await?;
    let sink = RedisTimeSeriesSink::connect(&config.sink.endpoint).await?;

    let (tx, rx) = mpsc::channel::<Batch>(config.pipeline.channel_capacity);
    let rx = Arc::new(Mutex::new(rx));
    let counter = ThroughputCounter::new();
    let keyspace = KeySpace::new(&config.sink.key_prefix, &config.sink.registry_key);

    let pool = WriterPool::spawn(
        config.sink.workers,
        rx,
        Arc::new(sink),
        keyspace,
        counter.clone(),
    );
    tracing::info!(workers = pool.len(), "writer pool started");

    let monitor = spawn_monitor(counter, tx.clone(), MONITOR_INTERVAL);

    let reader = StreamReader::new(
        source,
        config.source.start.as_cursor(),
        config.source.max_batch_size,
    );
    tracing::info!(
        stream = %config.source.stream,
        start = %config.source.start,
        "reader starting"
    );

    let result = tokio::select! {
        res = reader.run(tx) => res.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, exiting");
            Ok(())
        }
    };

    monitor.abort();
    result
}
