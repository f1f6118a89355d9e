use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::file::FileLogStorage;
use crate::redis_store::RedisLogStorage;
use crate::storage::LogStorage;
use crate::types::{LogEntry, LogSession};

/// Log manager with a once-per-process backend choice.
///
/// Probes Redis at startup when `prefer_redis` is set; any failure falls
/// back to the file store. The chosen backend never changes afterwards.
pub struct LogManager {
    storage: Box<dyn LogStorage>,
    backend_name: &'static str,
}

impl LogManager {
    pub async fn init(
        redis_url: &str,
        log_dir: &str,
        max_logs: usize,
        prefer_redis: bool,
    ) -> Result<Self> {
        if prefer_redis {
            match RedisLogStorage::connect(redis_url, max_logs).await {
                Ok(storage) => {
                    return Ok(Self {
                        storage: Box::new(storage),
                        backend_name: "redis",
                    });
                }
                Err(e) => {
                    warn!(error = %e, "redis unavailable, falling back to file log storage");
                }
            }
        }

        let storage = FileLogStorage::open(log_dir, max_logs)?;
        info!("using file log storage");
        Ok(Self {
            storage: Box::new(storage),
            backend_name: "file",
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    /// Record a log line in the store and mirror it to the process logger.
    pub async fn add_log(
        &self,
        message: &str,
        level: &str,
        session_id: Option<&str>,
        context: Option<Value>,
    ) {
        let sid = session_id.unwrap_or("default");
        let entry = LogEntry::new(message, level, sid, context);
        match entry.level.as_str() {
            "ERROR" => tracing::error!(session_id = sid, "{}", message),
            "WARNING" => tracing::warn!(session_id = sid, "{}", message),
            "DEBUG" => tracing::debug!(session_id = sid, "{}", message),
            _ => tracing::info!(session_id = sid, "{}", message),
        }
        if let Err(e) = self.storage.add_log(entry).await {
            warn!(error = %e, "failed to persist log entry");
        }
    }

    pub async fn get_logs(&self, limit: usize, session_id: Option<&str>) -> Result<Vec<LogEntry>> {
        self.storage.get_logs(limit, session_id).await
    }

    pub async fn clear_logs(&self, session_id: Option<&str>) -> Result<()> {
        self.storage.clear_logs(session_id).await
    }

    pub async fn create_session(&self) -> Result<String> {
        let id = self.storage.create_session().await?;
        self.add_log(&format!("session created: {}", id), "INFO", Some(&id), None)
            .await;
        Ok(id)
    }

    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        self.add_log(
            &format!("session closed: {}", session_id),
            "INFO",
            Some(session_id),
            None,
        )
        .await;
        self.storage.close_session(session_id).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<LogSession>> {
        self.storage.list_sessions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_file_when_redis_refused() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on this port; connect must fail fast and fall back.
        let manager = LogManager::init(
            "redis://127.0.0.1:1/0",
            dir.path().to_str().unwrap(),
            100,
            true,
        )
        .await
        .unwrap();
        assert_eq!(manager.backend_name(), "file");

        manager.add_log("hello", "info", None, None).await;
        let logs = manager.get_logs(10, None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].session_id, "default");
    }

    #[tokio::test]
    async fn file_backend_is_used_directly_when_not_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let manager = LogManager::init(
            "redis://127.0.0.1:1/0",
            dir.path().to_str().unwrap(),
            100,
            false,
        )
        .await
        .unwrap();
        assert_eq!(manager.backend_name(), "file");

        let sid = manager.create_session().await.unwrap();
        manager.close_session(&sid).await.unwrap();
        let sessions = manager.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
    }
}
