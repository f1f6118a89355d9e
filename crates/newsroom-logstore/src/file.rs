use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::LogStorage;
use crate::types::{LogEntry, LogSession};

/// File-backed log storage, used when Redis is unreachable at startup.
///
/// State lives in memory and is flushed to two JSON files after every
/// mutation. Oldest entries are trimmed past `max_logs`.
pub struct FileLogStorage {
    state: Mutex<FileState>,
    logs_path: PathBuf,
    sessions_path: PathBuf,
    max_logs: usize,
}

struct FileState {
    logs: Vec<LogEntry>,
    sessions: HashMap<String, LogSession>,
}

impl FileLogStorage {
    pub fn open(log_dir: &str, max_logs: usize) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        std::fs::create_dir_all(&dir)?;
        let logs_path = dir.join("newsroom_logs.json");
        let sessions_path = dir.join("sessions.json");

        let logs = load_json(&logs_path).unwrap_or_default();
        let sessions = load_json(&sessions_path).unwrap_or_default();

        info!(dir = log_dir, "file log storage initialised");
        Ok(Self {
            state: Mutex::new(FileState { logs, sessions }),
            logs_path,
            sessions_path,
            max_logs,
        })
    }

    fn flush(&self, state: &FileState) {
        if let Err(e) = save_json(&self.logs_path, &state.logs) {
            warn!(error = %e, "failed to flush logs file");
        }
        if let Err(e) = save_json(&self.sessions_path, &state.sessions) {
            warn!(error = %e, "failed to flush sessions file");
        }
    }
}

#[async_trait]
impl LogStorage for FileLogStorage {
    async fn add_log(&self, entry: LogEntry) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.logs.push(entry);
        if state.logs.len() > self.max_logs {
            let excess = state.logs.len() - self.max_logs;
            state.logs.drain(..excess);
        }
        self.flush(&state);
        Ok(())
    }

    async fn get_logs(&self, limit: usize, session_id: Option<&str>) -> Result<Vec<LogEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .rev() // newest first, matching the Redis backend
            .filter(|e| session_id.is_none_or(|sid| e.session_id == sid))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn clear_logs(&self, session_id: Option<&str>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match session_id {
            None => state.logs.clear(),
            Some(sid) => state.logs.retain(|e| e.session_id != sid),
        }
        self.flush(&state);
        Ok(())
    }

    async fn create_session(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let session = LogSession::new(Uuid::new_v4().to_string());
        let id = session.id.clone();
        state.sessions.insert(id.clone(), session);
        self.flush(&state);
        Ok(id)
    }

    async fn close_session(&self, session_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.get_mut(session_id) {
            session.close();
        }
        self.flush(&state);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<LogSession>> {
        let state = self.state.lock().unwrap();
        Ok(state.sessions.values().cloned().collect())
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Option<T> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable state file ignored");
            None
        }
    }
}

fn save_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;

    fn storage(dir: &tempfile::TempDir, max_logs: usize) -> FileLogStorage {
        FileLogStorage::open(dir.path().to_str().unwrap(), max_logs).unwrap()
    }

    #[tokio::test]
    async fn logs_round_trip_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir, 100);

        store
            .add_log(LogEntry::new("first", "info", "s1", None))
            .await
            .unwrap();
        store
            .add_log(LogEntry::new("second", "warning", "s1", None))
            .await
            .unwrap();

        let logs = store.get_logs(10, None).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "second");
        assert_eq!(logs[0].level, "WARNING");
    }

    #[tokio::test]
    async fn session_filter_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir, 100);
        store.add_log(LogEntry::new("a", "info", "s1", None)).await.unwrap();
        store.add_log(LogEntry::new("b", "info", "s2", None)).await.unwrap();

        let s1 = store.get_logs(10, Some("s1")).await.unwrap();
        assert_eq!(s1.len(), 1);

        store.clear_logs(Some("s1")).await.unwrap();
        assert!(store.get_logs(10, Some("s1")).await.unwrap().is_empty());
        assert_eq!(store.get_logs(10, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trims_past_max_logs() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir, 3);
        for i in 0..5 {
            store
                .add_log(LogEntry::new(&format!("m{}", i), "info", "s", None))
                .await
                .unwrap();
        }
        let logs = store.get_logs(10, None).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "m4");
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let sid;
        {
            let store = storage(&dir, 100);
            sid = store.create_session().await.unwrap();
            store.add_log(LogEntry::new("persisted", "info", &sid, None)).await.unwrap();
            store.close_session(&sid).await.unwrap();
        }
        let store = storage(&dir, 100);
        let logs = store.get_logs(10, Some(&sid)).await.unwrap();
        assert_eq!(logs.len(), 1);
        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Closed);
        assert!(sessions[0].closed_at.is_some());
    }
}
