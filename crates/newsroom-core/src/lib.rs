//! `newsroom-core` — shared types, configuration, and the top-level error
//! enum used across the newsroom workspace.

pub mod config;
pub mod error;
pub mod sources;
pub mod types;

pub use config::NewsroomConfig;
pub use error::{NewsroomError, Result};
pub use sources::SourcesDescriptor;
pub use types::{ContentType, RawItem, ScrapeCounters, SourceKind};
