//! SQL DDL for all Tally tables.
//!
//! Defines `people`, `themes`, `actions`, `action_themes`, `conversations`
//! and `schema_meta`. Identifiers are 12-byte BLOBs, timestamps RFC 3339 text.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id BLOB PRIMARY KEY CHECK(length(id) = 12),
    name TEXT NOT NULL,
    role TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_people_name ON people(name);

CREATE TABLE IF NOT EXISTS themes (
    id BLOB PRIMARY KEY CHECK(length(id) = 12),
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS actions (
    id BLOB PRIMARY KEY CHECK(length(id) = 12),
    person_id BLOB NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    valence TEXT NOT NULL CHECK(valence IN ('positive','negative','neutral')),
    occurred_at TEXT NOT NULL,
    refs TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_actions_person ON actions(person_id);
CREATE INDEX IF NOT EXISTS idx_actions_valence ON actions(valence);

CREATE TABLE IF NOT EXISTS action_themes (
    action_id BLOB NOT NULL REFERENCES actions(id) ON DELETE CASCADE,
    theme_id BLOB NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
    PRIMARY KEY (action_id, theme_id)
);

CREATE TABLE IF NOT EXISTS conversations (
    id BLOB PRIMARY KEY CHECK(length(id) = 12),
    person_id BLOB NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    summary TEXT NOT NULL,
    follow_up TEXT,
    held_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversations_person ON conversations(person_id);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
