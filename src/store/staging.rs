//! Stage & commit. An in-memory scratch table absorbs every record
//! emitted during one `add` run; at end-of-run a single transaction
//! does `INSERT OR IGNORE INTO sindex SELECT * FROM staging` for
//! atomic, deduplicated publication.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

use super::records::IndexRecord;
use super::Store;

const STAGING_SCHEMA: &str = r#"
CREATE TABLE scratch.staging (
    file INTEGER NOT NULL,
    line INTEGER NOT NULL,
    column INTEGER NOT NULL,
    symbol TEXT NOT NULL,
    kind INTEGER NOT NULL,
    context TEXT,
    mode INTEGER NOT NULL
);
"#;

/// `ATTACH` the scratch database and create its staging table. The
/// table lives in a different attached database than `sindex`, so it
/// cannot carry the foreign-key declaration.
pub fn open(conn: &Connection) -> Result<()> {
    conn.execute_batch("ATTACH DATABASE ':memory:' AS scratch;")
        .context("failed to attach staging scratch database")?;
    conn.execute_batch(STAGING_SCHEMA)
        .context("failed to create staging table")?;
    Ok(())
}

/// Stage one record. Duplicate-insertion policy `INSERT OR IGNORE` on
/// the same uniqueness key as the persistent `sindex` table.
pub fn insert(conn: &Connection, record: &IndexRecord) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO scratch.staging(file, line, column, symbol, kind, context, mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.file,
            record.line,
            record.column,
            record.symbol,
            record.kind.as_i64(),
            record.context,
            record.mode,
        ],
    )
    .context("failed to stage index record")?;
    Ok(())
}

pub fn staged_count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM scratch.staging", [], |row| row.get(0))
        .context("failed to count staged records")
}

/// Merge the scratch staging table into the persistent `sindex` table
/// in one transaction, then detach the scratch database. Readers never
/// observe a partially written update.
pub fn commit(store: &mut Store) -> Result<i64> {
    let staged = staged_count(&store.conn)?;

    let merged = store.with_write_txn(|tx| {
        tx.execute(
            "INSERT OR IGNORE INTO sindex SELECT * FROM scratch.staging",
            [],
        )
        .context("failed to merge staging table into sindex")
    })?;

    store
        .conn
        .execute_batch("DETACH DATABASE scratch;")
        .context("failed to detach staging scratch database")?;

    info!(staged, merged, "committed staged index records");
    Ok(merged as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::records::Kind;

    fn rec(symbol: &str, line: i64) -> IndexRecord {
        IndexRecord {
            file: 1,
            line,
            column: 1,
            symbol: symbol.to_string(),
            kind: Kind::Variable,
            context: String::new(),
            mode: 0,
        }
    }

    #[test]
    fn duplicate_records_coalesce_in_staging() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute("INSERT INTO file(name, mtime) VALUES ('a.c', 1)", [])
            .unwrap();
        open(&store.conn).unwrap();
        insert(&store.conn, &rec("x", 1)).unwrap();
        insert(&store.conn, &rec("x", 1)).unwrap();
        assert_eq!(staged_count(&store.conn).unwrap(), 1);
    }

    #[test]
    fn commit_merges_staged_rows_into_sindex() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute("INSERT INTO file(name, mtime) VALUES ('a.c', 1)", [])
            .unwrap();
        open(&store.conn).unwrap();
        insert(&store.conn, &rec("x", 1)).unwrap();
        insert(&store.conn, &rec("y", 2)).unwrap();

        let merged = commit(&mut store).unwrap();
        assert_eq!(merged, 2);
        let total: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM sindex", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 2);
    }
}
