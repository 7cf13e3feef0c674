//! Remover. `DELETE FROM file WHERE name GLOB ?` per
//! pattern, inside one write transaction; cascade handles the index
//! records.

use anyhow::{Context, Result};
use rusqlite::params;
use tracing::info;

use super::Store;

/// Delete every file record whose name matches any of `patterns`
/// (each a GLOB pattern), cascading to their `sindex` rows. Returns the
/// total number of file records removed.
pub fn remove(store: &mut Store, patterns: &[String]) -> Result<i64> {
    store.with_write_txn(|tx| {
        let mut removed = 0i64;
        for pattern in patterns {
            let count = tx
                .execute("DELETE FROM file WHERE name GLOB ?1", params![pattern])
                .with_context(|| format!("failed to remove files matching `{pattern}`"))?;
            info!(pattern, count, "removed file records");
            removed += count as i64;
        }
        Ok(removed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::files::get_file_by_name;

    #[test]
    fn removes_matching_files_and_cascades_records() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "INSERT INTO file(name, mtime) VALUES ('a.c', 1), ('b.c', 1), ('other.h', 1);",
            )
            .unwrap();
        let a_id = get_file_by_name(&store.conn, "a.c").unwrap().unwrap().id;
        store
            .conn
            .execute(
                "INSERT INTO sindex(file, line, column, symbol, kind, context, mode) VALUES (?1, 1, 1, 'x', 118, NULL, 0)",
                params![a_id],
            )
            .unwrap();

        let removed = remove(&mut store, &["*.c".to_string()]).unwrap();
        assert_eq!(removed, 2);
        assert!(get_file_by_name(&store.conn, "a.c").unwrap().is_none());
        assert!(get_file_by_name(&store.conn, "other.h").unwrap().is_some());

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM sindex", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
