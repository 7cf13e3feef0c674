//! File registry. Stream-indexed, growable arena mapping
//! the frontend's stream numbers to file-ids, with mtime-based
//! invalidation. Grounded on the design notes' "stream-indexed
//! registry... growable vector with a sentinel variant."

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::store::files::{delete_file_by_id, get_file_by_name, insert_file};
use crate::store::Store;

/// One slot of the stream-indexed arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Outside the project root, or not a real file.
    Ignored,
    Id(i64),
}

/// Maps frontend stream numbers to file-ids. Grows lazily as the
/// frontend reveals more streams; never shrinks during a run.
pub struct FileRegistry {
    project_root: PathBuf,
    slots: Vec<Option<Slot>>,
    include_local_syms: bool,
}

impl FileRegistry {
    pub fn new(project_root: PathBuf, include_local_syms: bool) -> Self {
        Self {
            project_root,
            slots: Vec::new(),
            include_local_syms,
        }
    }

    pub fn include_local_syms(&self) -> bool {
        self.include_local_syms
    }

    /// Is `stream` mapped to an ignored slot? Returns `false` for an
    /// unknown (not-yet-seen) stream.
    pub fn is_ignored(&self, stream: usize) -> bool {
        matches!(self.slots.get(stream), Some(Some(Slot::Ignored)))
    }

    pub fn file_id(&self, stream: usize) -> Option<i64> {
        match self.slots.get(stream) {
            Some(Some(Slot::Id(id))) => Some(*id),
            _ => None,
        }
    }

    /// Ensure `stream`'s slot is populated, performing the
    /// `stat`/`lookup`/`delete-if-stale`/`insert` sequence under a held
    /// write transaction. `path` is the stream's backing path as the
    /// frontend names it.
    pub fn ensure(&mut self, store: &mut Store, stream: usize, path: &Path) -> Result<()> {
        if self.slots.get(stream).and_then(|s| *s).is_some() {
            return Ok(());
        }
        while self.slots.len() <= stream {
            self.slots.push(None);
        }

        let real_path = std::fs::canonicalize(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;

        if !real_path.starts_with(&self.project_root) {
            debug!(path = %path.display(), "ignoring file outside project root");
            self.slots[stream] = Some(Slot::Ignored);
            return Ok(());
        }

        let relative = real_path
            .strip_prefix(&self.project_root)
            .expect("checked starts_with above")
            .to_path_buf();
        let name = relative.to_string_lossy().replace('\\', "/");

        let mtime = mtime_seconds(&real_path)
            .with_context(|| format!("failed to stat {}", real_path.display()))?;

        let id = store.with_write_txn(|tx| ensure_file_record(tx, &name, mtime))?;
        self.slots[stream] = Some(Slot::Id(id));
        Ok(())
    }
}

fn ensure_file_record(tx: &Connection, name: &str, mtime: i64) -> Result<i64> {
    match get_file_by_name(tx, name)? {
        Some(existing) if existing.mtime == mtime => {
            debug!(file = name, id = existing.id, "reusing unchanged file record");
            Ok(existing.id)
        }
        Some(stale) => {
            warn!(file = name, id = stale.id, "mtime changed, invalidating file record");
            delete_file_by_id(tx, stale.id)?;
            let id = insert_file(tx, name, mtime)?;
            Ok(id)
        }
        None => {
            let id = insert_file(tx, name, mtime)?;
            debug!(file = name, id, "registered new file record");
            Ok(id)
        }
    }
}

fn mtime_seconds(path: &Path) -> Result<i64> {
    use std::time::UNIX_EPOCH;
    let metadata = std::fs::metadata(path)?;
    let mtime = metadata.modified()?;
    let seconds = mtime
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Ok(seconds as i64)
}
