//! tick-relay: batching transfer pipeline from a Redis trade stream to RedisTimeSeries
//!
//! This library provides the core components for:
//! - Blocking XREAD consumption of a trade stream with cursor tracking
//! - Bounded batch hand-off with backpressure between reader and writers
//! - A pool of writer workers issuing pipelined TS.ADD upserts
//! - Translation of trade records into price/size series points
//! - A global symbol registry updated alongside each batch
//! - Per-second throughput and queue-depth reporting
//! - Structured logging via tracing

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod telemetry;
