//! `newsroom-sources` — ingestion drivers.
//!
//! One driver per source family, all normalising a remote JSON surface into
//! [`newsroom_core::RawItem`]s. Drivers pace their requests (each source has
//! its own politeness budget) and classify failures as retryable or fatal;
//! everything past the normalized record (selectors, markup quirks) stays
//! on the other side of this boundary.

pub mod blog;
pub mod chat;
pub mod driver;
pub mod error;
pub mod forum;
pub mod tech;

pub use blog::BlogDriver;
pub use chat::ChatDriver;
pub use driver::{build_driver, SourceDriver};
pub use error::FetchError;
pub use forum::ForumDriver;
pub use tech::TechDriver;
