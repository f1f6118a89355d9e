use rusqlite::{Connection, Result};

/// Initialise record tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    create_raw_items_table(conn)?;
    create_processed_items_table(conn)?;
    create_short_form_items_table(conn)?;
    Ok(())
}

fn create_raw_items_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS raw_items (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            source_kind   TEXT NOT NULL,
            source_id     TEXT NOT NULL,
            title         TEXT NOT NULL,
            body          TEXT NOT NULL DEFAULT '',
            url           TEXT NOT NULL,
            author        TEXT,
            published_at  TEXT,
            fetched_at    TEXT NOT NULL,
            metadata      TEXT NOT NULL DEFAULT '{}',
            vector_id     TEXT,
            UNIQUE(source_kind, source_id)
        );
        CREATE INDEX IF NOT EXISTS idx_raw_kind_fetched
            ON raw_items(source_kind, fetched_at DESC);",
    )
}

fn create_processed_items_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS processed_items (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            source_kind      TEXT NOT NULL,
            source_id        TEXT NOT NULL,
            is_relevant      INTEGER NOT NULL DEFAULT 0,
            relevance_score  REAL NOT NULL DEFAULT 0,
            relevance_reason TEXT NOT NULL DEFAULT '',
            original_summary TEXT,
            editorial_title  TEXT,
            editorial_teaser TEXT,
            editorial_body   TEXT,
            image_prompt     TEXT,
            content_type     TEXT,
            model_name       TEXT NOT NULL DEFAULT '',
            processing_ms    INTEGER NOT NULL DEFAULT 0,
            processed_at     TEXT NOT NULL,
            UNIQUE(source_kind, source_id)
        );
        CREATE INDEX IF NOT EXISTS idx_processed_kind_at
            ON processed_items(source_kind, processed_at DESC);
        CREATE INDEX IF NOT EXISTS idx_processed_relevant
            ON processed_items(is_relevant);",
    )
}

fn create_short_form_items_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS short_form_items (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            source_kind         TEXT NOT NULL,
            source_id           TEXT NOT NULL,
            title               TEXT NOT NULL,
            body                TEXT NOT NULL,
            hashtags            TEXT NOT NULL DEFAULT '[]',
            formatted           TEXT NOT NULL,
            char_count          INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            published_at        TEXT,
            platform_message_id INTEGER,
            is_published        INTEGER NOT NULL DEFAULT 0,
            UNIQUE(source_kind, source_id)
        );
        CREATE INDEX IF NOT EXISTS idx_short_form_kind
            ON short_form_items(source_kind, created_at DESC);",
    )
}
