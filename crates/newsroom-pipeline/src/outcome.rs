use serde::Serialize;

use newsroom_core::types::ScrapeCounters;

/// Terminal state of one item's journey through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Full pipeline ran; processed record exists.
    Saved { relevant: bool, short_form: bool },
    /// Raw record kept, enrichment not attempted.
    SavedRawOnly { reason: &'static str },
    /// Raw record kept; text below the enrichment floor.
    TooShort,
    /// Dropped before any write.
    Invalid { reason: String },
    /// `(source_kind, source_id)` already present; no writes.
    DuplicateId,
    /// Near-neighbor hit at or above the threshold; raw record rolled back.
    SemanticDuplicate { duplicate_of: String, score: f32 },
    /// Raw persisted; editorial failed, so the processed record says
    /// not-relevant with the failure as its reason.
    EditorialFailed,
    /// A racing worker already wrote the processed record.
    Conflict,
    /// Record-store failure; item abandoned, job continues.
    Error { message: String },
}

impl ItemOutcome {
    /// Fold this outcome into the job counters.
    pub fn tally(&self, counters: &mut ScrapeCounters) {
        match self {
            ItemOutcome::Saved { relevant, .. } => {
                counters.saved += 1;
                if *relevant {
                    counters.editorial_processed += 1;
                }
            }
            ItemOutcome::SavedRawOnly { .. }
            | ItemOutcome::TooShort
            | ItemOutcome::EditorialFailed => counters.saved += 1,
            ItemOutcome::Invalid { .. }
            | ItemOutcome::DuplicateId
            | ItemOutcome::Conflict => counters.skipped += 1,
            ItemOutcome::SemanticDuplicate { .. } => counters.semantic_duplicates += 1,
            ItemOutcome::Error { .. } => counters.errors += 1,
        }
    }

    /// One-line description for the session log.
    pub fn describe(&self) -> String {
        match self {
            ItemOutcome::Saved { relevant, short_form } => format!(
                "saved (relevant={}, short_form={})",
                relevant, short_form
            ),
            ItemOutcome::SavedRawOnly { reason } => {
                format!("saved without enrichment ({})", reason)
            }
            ItemOutcome::TooShort => "saved, too short for enrichment".to_string(),
            ItemOutcome::Invalid { reason } => format!("dropped: {}", reason),
            ItemOutcome::DuplicateId => "skipped: exact duplicate".to_string(),
            ItemOutcome::SemanticDuplicate { duplicate_of, score } => format!(
                "rolled back: semantic duplicate of {} (score {:.3})",
                duplicate_of, score
            ),
            ItemOutcome::EditorialFailed => {
                "saved, editorial failed (kept as not relevant)".to_string()
            }
            ItemOutcome::Conflict => "skipped: concurrent writer won".to_string(),
            ItemOutcome::Error { message } => format!("error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_maps_outcomes_to_counters() {
        let mut c = ScrapeCounters::default();
        ItemOutcome::Saved { relevant: true, short_form: true }.tally(&mut c);
        ItemOutcome::Saved { relevant: false, short_form: false }.tally(&mut c);
        ItemOutcome::TooShort.tally(&mut c);
        ItemOutcome::DuplicateId.tally(&mut c);
        ItemOutcome::Conflict.tally(&mut c);
        ItemOutcome::SemanticDuplicate { duplicate_of: "x".into(), score: 0.97 }.tally(&mut c);
        ItemOutcome::Error { message: "db".into() }.tally(&mut c);

        assert_eq!(c.saved, 3);
        assert_eq!(c.editorial_processed, 1);
        assert_eq!(c.skipped, 2);
        assert_eq!(c.semantic_duplicates, 1);
        assert_eq!(c.errors, 1);
    }
}
