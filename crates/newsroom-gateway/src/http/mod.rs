pub mod comparison;
pub mod health;
pub mod logs;
pub mod records;
pub mod scrape;
pub mod statistics;

use newsroom_core::types::SourceKind;

use crate::error::{not_found, ApiError};

/// Parse a `{source}` path segment, 404 on unknown kinds.
pub fn parse_kind(source: &str) -> Result<SourceKind, ApiError> {
    source
        .parse()
        .map_err(|_| not_found(format!("unknown source kind: {}", source)))
}
