//! Reporter sink: consumes the frontend's four callbacks and
//! normalizes them into staged index records. Modeled as a `Sink`
//! struct implementing the `Reporter` trait rather than a
//! function-pointer table.

use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

use crate::frontend::{Position, Reporter, Symbol};
use crate::mode;
use crate::registry::FileRegistry;
use crate::store::records::{IndexRecord, Kind};
use crate::store::staging;

/// Normalizes frontend callbacks into staged `sindex` rows, per the
/// locality filter, ignored-stream filter, empty-identifier drop,
/// context propagation, and composite member-name rules.
pub struct Sink<'a> {
    conn: &'a Connection,
    registry: &'a FileRegistry,
}

impl<'a> Sink<'a> {
    pub fn new(conn: &'a Connection, registry: &'a FileRegistry) -> Self {
        Self { conn, registry }
    }

    /// Drop records for streams mapped to the ignored sentinel.
    fn stream_is_ignored(&self, pos: Position) -> bool {
        self.registry.is_ignored(pos.stream)
    }

    fn file_id(&self, pos: Position) -> Option<i64> {
        self.registry.file_id(pos.stream)
    }

    fn stage(&self, record: IndexRecord) -> Result<()> {
        staging::insert(self.conn, &record)
    }
}

impl Reporter for Sink<'_> {
    fn r_symdef(&mut self, context: Option<&str>, sym: &Symbol) -> Result<()> {
        if self.stream_is_ignored(sym.pos) {
            return Ok(());
        }
        // Locality filter.
        if sym.is_local && !self.registry.include_local_syms() {
            return Ok(());
        }
        // Empty identifier is a frontend anomaly.
        let Some(ident) = sym.ident.filter(|s| !s.is_empty()) else {
            warn!(stream = sym.pos.stream, line = sym.pos.line, "frontend anomaly: empty identifier on symdef, dropping");
            return Ok(());
        };
        let Some(file_id) = self.file_id(sym.pos) else {
            return Ok(());
        };

        self.stage(IndexRecord {
            file: file_id,
            line: sym.pos.line,
            column: sym.pos.column,
            symbol: ident.to_string(),
            kind: sym.kind,
            context: context.unwrap_or("").to_string(),
            mode: mode::DEF,
        })
    }

    fn r_symbol(&mut self, context: Option<&str>, use_mode: u32, pos: Position, sym: &Symbol) -> Result<()> {
        if self.stream_is_ignored(pos) {
            return Ok(());
        }
        if sym.is_local && !self.registry.include_local_syms() {
            return Ok(());
        }
        let Some(ident) = sym.ident.filter(|s| !s.is_empty()) else {
            warn!(stream = pos.stream, line = pos.line, "frontend anomaly: empty identifier on symbol use, dropping");
            return Ok(());
        };
        let Some(file_id) = self.file_id(pos) else {
            return Ok(());
        };

        self.stage(IndexRecord {
            file: file_id,
            line: pos.line,
            column: pos.column,
            symbol: ident.to_string(),
            kind: sym.kind,
            context: context.unwrap_or("").to_string(),
            mode: use_mode,
        })
    }

    fn r_memdef(&mut self, context: Option<&str>, pos: Position, tag: Option<&str>, member: Option<&str>) -> Result<()> {
        if self.stream_is_ignored(pos) {
            return Ok(());
        }
        let Some(file_id) = self.file_id(pos) else {
            return Ok(());
        };
        let symbol = composite_member_name(tag, member);

        self.stage(IndexRecord {
            file: file_id,
            line: pos.line,
            column: pos.column,
            symbol,
            kind: Kind::Member,
            context: context.unwrap_or("").to_string(),
            mode: mode::DEF,
        })
    }

    fn r_member(
        &mut self,
        context: Option<&str>,
        use_mode: u32,
        pos: Position,
        tag: Option<&str>,
        member: Option<&str>,
    ) -> Result<()> {
        if self.stream_is_ignored(pos) {
            return Ok(());
        }
        let Some(file_id) = self.file_id(pos) else {
            return Ok(());
        };
        let symbol = composite_member_name(tag, member);

        self.stage(IndexRecord {
            file: file_id,
            line: pos.line,
            column: pos.column,
            symbol,
            kind: Kind::Member,
            context: context.unwrap_or("").to_string(),
            mode: use_mode,
        })
    }
}

/// `"<tag>.<member>"`: `tag` defaults to `?` if the aggregate has no
/// identifier, `member` defaults to `?` if named but missing and to
/// `*` when the whole aggregate is the target.
pub fn composite_member_name(tag: Option<&str>, member: Option<&str>) -> String {
    let tag = tag.filter(|s| !s.is_empty()).unwrap_or("?");
    let member = match member {
        Some(m) if !m.is_empty() => m,
        Some(_) => "?",
        None => "*",
    };
    format!("{tag}.{member}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_member_name_defaults() {
        assert_eq!(composite_member_name(Some("point"), Some("x")), "point.x");
        assert_eq!(composite_member_name(None, Some("x")), "?.x");
        assert_eq!(composite_member_name(Some("point"), None), "point.*");
        assert_eq!(composite_member_name(None, None), "?.*");
    }
}
