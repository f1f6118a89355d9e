use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::LogStorage;
use crate::types::{LogEntry, LogSession};

const LOG_KEY: &str = "newsroom_logs";
const SESSION_KEY: &str = "newsroom_sessions";

/// Redis-backed log storage: logs in a trimmed list, sessions in a hash.
pub struct RedisLogStorage {
    conn: ConnectionManager,
    max_logs: usize,
}

impl RedisLogStorage {
    /// Connect and verify with a PING. Errors here make the manager fall
    /// back to the file store; this is the only moment the choice is made.
    pub async fn connect(redis_url: &str, max_logs: usize) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = ConnectionManager::new(client).await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        info!(url = redis_url, "redis log storage connected");
        Ok(Self { conn, max_logs })
    }
}

#[async_trait]
impl LogStorage for RedisLogStorage {
    async fn add_log(&self, entry: LogEntry) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&entry)?;
        let _: () = conn.lpush(LOG_KEY, json).await?;
        let _: () = conn.ltrim(LOG_KEY, 0, self.max_logs as isize - 1).await?;
        Ok(())
    }

    async fn get_logs(&self, limit: usize, session_id: Option<&str>) -> Result<Vec<LogEntry>> {
        let mut conn = self.conn.clone();
        // When filtering by session we scan the whole retained window, since
        // matching lines may sit anywhere in it.
        let range_end = if session_id.is_some() {
            -1
        } else {
            limit as isize - 1
        };
        let raw: Vec<String> = conn.lrange(LOG_KEY, 0, range_end).await?;

        let entries = raw
            .iter()
            .filter_map(|line| match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "unreadable log line skipped");
                    None
                }
            })
            .filter(|entry| session_id.is_none_or(|sid| entry.session_id == sid))
            .take(limit)
            .collect();
        Ok(entries)
    }

    async fn clear_logs(&self, session_id: Option<&str>) -> Result<()> {
        let mut conn = self.conn.clone();
        match session_id {
            None => {
                let _: () = conn.del(LOG_KEY).await?;
            }
            Some(sid) => {
                let raw: Vec<String> = conn.lrange(LOG_KEY, 0, -1).await?;
                let keep: Vec<String> = raw
                    .into_iter()
                    .filter(|line| {
                        serde_json::from_str::<LogEntry>(line)
                            .map(|e| e.session_id != sid)
                            .unwrap_or(false)
                    })
                    .collect();
                let _: () = conn.del(LOG_KEY).await?;
                if !keep.is_empty() {
                    // lrange returned newest-first; rpush restores that order.
                    let _: () = conn.rpush(LOG_KEY, keep).await?;
                }
            }
        }
        Ok(())
    }

    async fn create_session(&self) -> Result<String> {
        let mut conn = self.conn.clone();
        let session = LogSession::new(Uuid::new_v4().to_string());
        let json = serde_json::to_string(&session)?;
        let _: () = conn.hset(SESSION_KEY, &session.id, json).await?;
        Ok(session.id)
    }

    async fn close_session(&self, session_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(SESSION_KEY, session_id).await?;
        if let Some(raw) = raw {
            if let Ok(mut session) = serde_json::from_str::<LogSession>(&raw) {
                session.close();
                let json = serde_json::to_string(&session)?;
                let _: () = conn.hset(SESSION_KEY, session_id, json).await?;
            }
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<LogSession>> {
        let mut conn = self.conn.clone();
        let raw: std::collections::HashMap<String, String> = conn.hgetall(SESSION_KEY).await?;
        Ok(raw
            .values()
            .filter_map(|v| serde_json::from_str(v).ok())
            .collect())
    }
}
