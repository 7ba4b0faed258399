//! Database schema SQL for the persisted preference store.

/// One row per preference key; `kind` tags how `value` is parsed back.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
