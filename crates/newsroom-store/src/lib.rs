//! `newsroom-store` — durable relational storage for raw, processed, and
//! short-form records.
//!
//! One SQLite database, initialised idempotently on startup. Writes that
//! touch more than one entity for the same item (vector attach + processed +
//! short-form) run under a single transaction; either all land or none.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{NewProcessed, NewShortForm, RecordStore};
pub use types::{ProcessedRecord, RawRecord, ShortFormRecord, SourceStats, StoreStats};
