use serde::{Deserialize, Serialize};

use newsroom_core::config::MAX_ITEMS_CAP;

/// Validated job parameters.
///
/// `filters` is the source-specific selector list (boards, hubs, channels,
/// tags); when empty, the sources descriptor's defaults apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParams {
    pub max_items: u32,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default = "bool_true")]
    pub enable_llm: bool,
    #[serde(default = "bool_true")]
    pub enable_deduplication: bool,
}

fn bool_true() -> bool {
    true
}

impl JobParams {
    /// Reject out-of-range parameters with a message fit for a 400 response.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_items == 0 {
            return Err("max_items must be at least 1".to_string());
        }
        if self.max_items > MAX_ITEMS_CAP {
            return Err(format!(
                "max_items must be at most {}",
                MAX_ITEMS_CAP
            ));
        }
        if self.filters.iter().any(|f| f.trim().is_empty()) {
            return Err("filters must not contain empty entries".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_items: u32) -> JobParams {
        JobParams {
            max_items,
            filters: vec![],
            enable_llm: true,
            enable_deduplication: true,
        }
    }

    #[test]
    fn range_is_enforced() {
        assert!(params(0).validate().is_err());
        assert!(params(1).validate().is_ok());
        assert!(params(MAX_ITEMS_CAP).validate().is_ok());
        assert!(params(MAX_ITEMS_CAP + 1).validate().is_err());
    }

    #[test]
    fn blank_filters_are_rejected() {
        let mut p = params(10);
        p.filters = vec!["rust".into(), "  ".into()];
        assert!(p.validate().is_err());
    }

    #[test]
    fn toggles_default_on() {
        let p: JobParams = serde_json::from_str(r#"{"max_items": 5}"#).unwrap();
        assert!(p.enable_llm);
        assert!(p.enable_deduplication);
        assert!(p.filters.is_empty());
    }
}
