//! `newsroom-editorial` — the LLM editorial stage.
//!
//! Takes a raw item's title and body, asks the generation backend for a
//! structured verdict (relevance + rewrite), and survives every known way
//! the model mangles its output: fenced JSON, single quotes, placeholder
//! strings, missing keys. Parsing is total: any non-empty model reply
//! yields a usable verdict, possibly "not relevant".
//!
//! Short-form rendering is the one strict surface: a missing field there
//! fails the call and no short-form record is created.

pub mod error;
pub mod parse;
pub mod prompt;
pub mod service;
pub mod types;

pub use error::EditorialError;
pub use prompt::PromptDocument;
pub use service::EditorialService;
pub use types::{EditorialReview, EditorialVerdict, ShortFormDraft};
