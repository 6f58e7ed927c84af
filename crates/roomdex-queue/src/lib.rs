//! Distributed lock and per-dataroom indexing queue
//!
//! A Redis-backed coordination layer guaranteeing at most one active
//! indexing worker per dataroom while queued requests wait in FIFO order.
//! The lock and the queue both carry TTLs so a crashed worker is recoverable
//! without a heartbeat.

pub mod error;
pub mod manager;
pub mod memory;
pub mod redis;
pub mod request;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use manager::QueueManager;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use request::IndexingRequest;
pub use store::{KeyValueStore, StoreValue};
