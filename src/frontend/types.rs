//! Wire types of the frontend callback contract: `position` (stream,
//! line, column) and the symbol type (`ident, kind, pos, is_local`).

use crate::store::records::Kind;

/// `(stream, line, column)`, 1-based line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub stream: usize,
    pub line: i64,
    pub column: i64,
}

/// A symbol occurrence as the frontend sees it, before the reporter
/// sink normalizes it into an index record.
#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub ident: Option<&'a str>,
    pub kind: Kind,
    pub pos: Position,
    pub is_local: bool,
}
