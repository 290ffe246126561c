//! Redis Streams source implementation

use super::TradeSource;
use crate::error::RelayError;
use crate::model::{StreamId, TradeRecord};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;

/// Trade source backed by a Redis Stream, consumed with blocking XREAD
///
/// Uses its own connection: a blocking XREAD parks the connection until
/// the stream has new entries, so it cannot be shared with the sink.
pub struct RedisStreamSource {
    conn: MultiplexedConnection,
    stream: String,
}

impl RedisStreamSource {
    /// Connect to the source endpoint and verify it is reachable
    pub async fn connect(
        endpoint: &str,
        stream: impl Into<String>,
    ) -> Result<Self, RelayError> {
        let mut conn = open_connection(endpoint).await.map_err(|reason| {
            RelayError::SourceConnect {
                endpoint: endpoint.to_string(),
                reason,
            }
        })?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| RelayError::SourceConnect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(endpoint, "connected to source stream");

        Ok(Self {
            conn,
            stream: stream.into(),
        })
    }
}

/// Open a multiplexed async connection to a Redis endpoint
pub(crate) async fn open_connection(
    endpoint: &str,
) -> Result<MultiplexedConnection, String> {
    let client = redis::Client::open(endpoint).map_err(|e| e.to_string())?;
    client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| e.to_string())
}

#[async_trait]
impl TradeSource for RedisStreamSource {
    async fn read_after(
        &mut self,
        cursor: &StreamId,
        max: usize,
    ) -> Result<Vec<TradeRecord>, RelayError> {
        // BLOCK 0: wait server-side until the stream has new entries
        let opts = StreamReadOptions::default().count(max).block(0);
        let reply: StreamReadReply = self
            .conn
            .xread_options(&[self.stream.as_str()], &[cursor.as_str()], &opts)
            .await
            .map_err(|e| RelayError::SourceRead(e.to_string()))?;

        let mut records = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                let mut fields = HashMap::with_capacity(entry.map.len());
                for (name, value) in entry.map {
                    match redis::from_redis_value::<String>(&value) {
                        Ok(v) => {
                            fields.insert(name, v);
                        }
                        Err(e) => {
                            tracing::warn!(
                                id = %entry.id,
                                field = %name,
                                error = %e,
                                "dropping non-string field value"
                            );
                        }
                    }
                }
                records.push(TradeRecord::new(StreamId::new(entry.id), fields));
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_failure_is_source_connect() {
        // Port 1 is never a redis server; connection is refused quickly
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            RedisStreamSource::connect("redis://127.0.0.1:1", "trades"),
        )
        .await
        .expect("connect attempt timed out");

        match result {
            Err(RelayError::SourceConnect { endpoint, .. }) => {
                assert_eq!(endpoint, "redis://127.0.0.1:1");
            }
            other => panic!("expected SourceConnect error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let err = redis::Client::open("not-a-url").err();
        assert!(err.is_some());
    }
}
