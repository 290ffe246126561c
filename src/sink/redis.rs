//! RedisTimeSeries sink implementation

use super::{BatchPipeline, SeriesSink};
use crate::error::RelayError;
use crate::source::redis::open_connection;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

/// Sink writing each batch as one pipelined RedisTimeSeries request
///
/// Every point goes through `TS.ADD ... ON_DUPLICATE first`, which makes
/// the write a no-op when a value already exists at that timestamp. That
/// first-write-wins rule is what keeps concurrent workers and best-effort
/// redelivery safe.
pub struct RedisTimeSeriesSink {
    conn: MultiplexedConnection,
}

impl RedisTimeSeriesSink {
    /// Connect to the destination endpoint and verify it is reachable
    pub async fn connect(endpoint: &str) -> Result<Self, RelayError> {
        let mut conn = open_connection(endpoint).await.map_err(|reason| {
            RelayError::SinkConnect {
                endpoint: endpoint.to_string(),
                reason,
            }
        })?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| RelayError::SinkConnect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(endpoint, "connected to time-series sink");

        Ok(Self { conn })
    }

    /// Build the redis pipeline for one translated batch
    fn build_pipe(pipeline: &BatchPipeline) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        for upsert in &pipeline.upserts {
            let mut cmd = redis::cmd("TS.ADD");
            cmd.arg(&upsert.key)
                .arg(upsert.timestamp)
                .arg(&upsert.value)
                .arg("ON_DUPLICATE")
                .arg("first");
            if !upsert.labels.is_empty() {
                cmd.arg("LABELS");
                for (name, value) in &upsert.labels {
                    cmd.arg(name).arg(value);
                }
            }
            pipe.add_command(cmd).ignore();
        }
        for registration in &pipeline.registrations {
            pipe.cmd("SADD")
                .arg(&registration.key)
                .arg(&registration.symbol)
                .ignore();
        }
        pipe
    }
}

#[async_trait]
impl SeriesSink for RedisTimeSeriesSink {
    async fn submit(&self, pipeline: BatchPipeline) -> Result<(), RelayError> {
        let pipe = Self::build_pipe(&pipeline);
        let mut conn = self.conn.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| RelayError::SinkWrite(e.to_string()))?;
        Ok(())
    }
}
