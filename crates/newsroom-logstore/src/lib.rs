//! `newsroom-logstore` — persistent live-log stream keyed by session id.
//!
//! Two interchangeable backends: a Redis list/hash pair when Redis answers
//! at startup, otherwise append-and-trim JSON files. The choice is made once
//! per process; there is no runtime failover.

pub mod error;
pub mod file;
pub mod manager;
pub mod redis_store;
pub mod storage;
pub mod types;

pub use error::LogStoreError;
pub use file::FileLogStorage;
pub use manager::LogManager;
pub use redis_store::RedisLogStorage;
pub use storage::LogStorage;
pub use types::{LogEntry, LogSession, SessionStatus};
