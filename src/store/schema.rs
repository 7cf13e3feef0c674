//! Persistent schema. Two tables: `file` (identity/mtime)
//! and `sindex` (occurrences), plus the `user_version` gate checked by
//! `Store::open`.

/// Schema version this crate writes and expects to read. Bumping this
/// is a breaking on-disk change.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    mtime INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sindex (
    file INTEGER NOT NULL REFERENCES file(id) ON DELETE CASCADE,
    line INTEGER NOT NULL,
    column INTEGER NOT NULL,
    symbol TEXT NOT NULL,
    kind INTEGER NOT NULL,
    context TEXT,
    mode INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS sindex_unique
    ON sindex(symbol, kind, mode, file, line, column);

CREATE INDEX IF NOT EXISTS sindex_file
    ON sindex(file);
"#;
