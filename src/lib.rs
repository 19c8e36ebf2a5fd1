//! suiwatch - Sui node event ingestion
//!
//! Subscribes to event categories on a node's push feed, routes each push by
//! subscription id, and persists decoded events in batched, all-or-nothing
//! upsert transactions.

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod handlers;
pub mod model;
pub mod queue;
pub mod rules;
pub mod sink;
pub mod storage;
pub mod subscription;
pub mod transport;
pub mod utils;

pub use sink::EventSink;
