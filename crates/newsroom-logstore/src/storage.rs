use async_trait::async_trait;

use crate::error::Result;
use crate::types::{LogEntry, LogSession};

/// Backend-neutral log storage. Both implementations keep at most
/// `max_logs` entries, newest retained.
#[async_trait]
pub trait LogStorage: Send + Sync {
    async fn add_log(&self, entry: LogEntry) -> Result<()>;

    /// Most recent entries first, optionally scoped to one session.
    async fn get_logs(&self, limit: usize, session_id: Option<&str>) -> Result<Vec<LogEntry>>;

    /// Drop all logs, or only one session's.
    async fn clear_logs(&self, session_id: Option<&str>) -> Result<()>;

    async fn create_session(&self) -> Result<String>;

    async fn close_session(&self, session_id: &str) -> Result<()>;

    async fn list_sessions(&self) -> Result<Vec<LogSession>>;
}
