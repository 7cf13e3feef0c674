//! Renderer: formats result rows via a `%`-directive /
//! `\`-escape template, with lazy, cursor-advancing source-line
//! extraction for `%s`. Implemented as an explicit state machine with
//! three states: `Literal`, `AfterPercent`, `AfterBackslash`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::mode::{self, Triple};
use crate::query::SearchRow;

pub const DEFAULT_FORMAT: &str = "(%m) %f\t%l\t%c\t%C\t%s";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Directive(char),
}

/// A parsed format template. Parsing is a three-state
/// machine; unknown directives and an unterminated trailing `%` are
/// fatal parse errors, as is any backslash escape other than `\t \r
/// \n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    AfterPercent,
    AfterBackslash,
}

impl Format {
    pub fn parse(template: &str) -> Result<Format> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut state = State::Literal;

        for ch in template.chars() {
            match state {
                State::Literal => match ch {
                    '%' => state = State::AfterPercent,
                    '\\' => state = State::AfterBackslash,
                    other => literal.push(other),
                },
                State::AfterPercent => {
                    if !matches!(ch, 'f' | 'l' | 'c' | 'C' | 'n' | 'm' | 'k' | 's') {
                        bail!("unknown format directive `%{ch}`");
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Directive(ch));
                    state = State::Literal;
                }
                State::AfterBackslash => {
                    let resolved = match ch {
                        't' => '\t',
                        'r' => '\r',
                        'n' => '\n',
                        other => bail!("unknown escape `\\{other}`"),
                    };
                    literal.push(resolved);
                    state = State::Literal;
                }
            }
        }

        match state {
            State::Literal => {}
            State::AfterPercent => bail!("unterminated `%` at end of format string"),
            State::AfterBackslash => bail!("unterminated `\\` at end of format string"),
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Format { pieces })
    }
}

/// Pretty-print `%m`: `def` for the `DEF` value, else three characters
/// over the AOF/VAL/PTR triples.
pub fn pretty_mode(value: u32) -> String {
    mode::pretty(value)
}

/// Keeps at most one file open and a running line cursor so `%s` can
/// extract source lines without re-reading from the start of the file
/// every time. Relies on rows arriving ordered by file then line;
/// lines strictly before the cursor cannot be revisited.
struct SourceCursor {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    line: i64,
}

impl SourceCursor {
    fn new() -> Self {
        Self {
            path: PathBuf::new(),
            reader: None,
            line: 0,
        }
    }

    fn line_text(&mut self, project_root: &Path, file: &str, line: i64) -> Result<String> {
        let path = project_root.join(file);
        if path != self.path {
            self.path = path.clone();
            self.reader = Some(BufReader::new(
                File::open(&path).with_context(|| format!("failed to open {}", path.display()))?,
            ));
            self.line = 0;
        }
        if line < self.line {
            bail!(
                "cannot rewind source cursor for {}: at line {}, requested line {line} (result rows must be ordered by file then line)",
                path.display(),
                self.line
            );
        }

        let reader = self.reader.as_mut().expect("reader set above");
        let mut buf = String::new();
        while self.line < line {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if read == 0 {
                bail!("{} has no line {line}", path.display());
            }
            self.line += 1;
        }
        Ok(buf.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Renders each row of `rows` against `format`, writing one line per
/// row (without a trailing newline of its own, the caller adds one)
/// to `out`.
pub fn render_all(
    format: &Format,
    rows: &[SearchRow],
    project_root: &Path,
    mut out: impl std::io::Write,
) -> Result<()> {
    let mut cursor = SourceCursor::new();
    for row in rows {
        render_row(format, row, project_root, &mut cursor, &mut out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_row(
    format: &Format,
    row: &SearchRow,
    project_root: &Path,
    cursor: &mut SourceCursor,
    out: &mut impl std::io::Write,
) -> Result<()> {
    for piece in &format.pieces {
        match piece {
            Piece::Literal(text) => write!(out, "{text}")?,
            Piece::Directive(directive) => match directive {
                'f' => write!(out, "{}", row.file)?,
                'l' => write!(out, "{}", row.line)?,
                'c' => write!(out, "{}", row.column)?,
                'C' => write!(out, "{}", row.context)?,
                'n' => write!(out, "{}", row.symbol)?,
                'm' => write!(out, "{}", pretty_mode(row.mode))?,
                'k' => write!(out, "{}", row.kind)?,
                's' => {
                    let text = cursor.line_text(project_root, &row.file, row.line)?;
                    write!(out, "{text}")?;
                }
                other => unreachable!("unknown directive `{other}` survived parsing"),
            },
        }
    }
    Ok(())
}

/// Triple accessor used by `%m`'s documentation/tests; kept alongside
/// the renderer since it is the renderer's own pretty-print contract.
pub fn triple_char(value: u32, triple: Triple) -> char {
    mode::triple_char(value, triple)
}
