//! The `sindex` row shape shared by staging, query, and render.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub file: i64,
    pub line: i64,
    pub column: i64,
    pub symbol: String,
    pub kind: Kind,
    pub context: String,
    pub mode: u32,
}

/// One-letter kind classifier. Stored as the ASCII byte value of the
/// code in an `INTEGER` column; see DESIGN.md's resolution of the
/// "kind as int vs char" open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Struct,
    Function,
    Variable,
    Member,
}

impl Kind {
    pub fn code(self) -> char {
        match self {
            Kind::Struct => 's',
            Kind::Function => 'f',
            Kind::Variable => 'v',
            Kind::Member => 'm',
        }
    }

    pub fn as_i64(self) -> i64 {
        self.code() as i64
    }

    pub fn from_code(code: char) -> Option<Kind> {
        match code {
            's' => Some(Kind::Struct),
            'f' => Some(Kind::Function),
            'v' => Some(Kind::Variable),
            'm' => Some(Kind::Member),
            _ => None,
        }
    }

    pub fn from_i64(value: i64) -> Option<Kind> {
        u8::try_from(value).ok().and_then(|b| Kind::from_code(b as char))
    }
}

/// Count of `sindex` rows for a given file, used by tests and by
/// `add`'s summary log line.
pub fn count_for_file(conn: &Connection, file_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sindex WHERE file = ?1",
        params![file_id],
        |row| row.get(0),
    )
    .context("failed to count index records")
}

/// Total row count, used by `add`'s end-of-run summary log.
pub fn total_count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM sindex", [], |row| row.get(0))
        .context("failed to count index records")
}

pub fn def_mode_i64() -> i64 {
    mode::DEF as i64
}
