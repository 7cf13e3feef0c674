//! `file` table CRUD. Row struct next to the SQL that backs it,
//! `rusqlite::params!` + `OptionalExtension` for the lookup/insert/
//! delete operations.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub id: i64,
    pub name: String,
    pub mtime: i64,
}

pub fn get_file_by_name(conn: &Connection, name: &str) -> Result<Option<FileRow>> {
    conn.query_row(
        "SELECT id, name, mtime FROM file WHERE name = ?1",
        params![name],
        |row| {
            Ok(FileRow {
                id: row.get(0)?,
                name: row.get(1)?,
                mtime: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to query file record")
}

/// Insert a new file record, returning its generated id.
pub fn insert_file(conn: &Connection, name: &str, mtime: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO file(name, mtime) VALUES (?1, ?2)",
        params![name, mtime],
    )
    .with_context(|| format!("failed to insert file record for {name}"))?;
    Ok(conn.last_insert_rowid())
}

/// Delete a file record by id. Cascades to its `sindex` rows.
pub fn delete_file_by_id(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM file WHERE id = ?1", params![id])
        .with_context(|| format!("failed to delete file record {id}"))?;
    Ok(())
}
