use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structured log line. Append-only within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC3339 UTC timestamp.
    pub timestamp: String,
    /// Upper-case level name (DEBUG, INFO, WARNING, ERROR).
    pub level: String,
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LogEntry {
    pub fn new(message: &str, level: &str, session_id: &str, context: Option<Value>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            level: level.to_uppercase(),
            message: message.to_string(),
            session_id: session_id.to_string(),
            context,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// A live-log scope. Created when a job starts, closed on orchestrator exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSession {
    pub id: String,
    pub created_at: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

impl LogSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now().to_rfc3339(),
            status: SessionStatus::Active,
            closed_at: None,
        }
    }

    pub fn close(&mut self) {
        self.status = SessionStatus::Closed;
        self.closed_at = Some(Utc::now().to_rfc3339());
    }
}
