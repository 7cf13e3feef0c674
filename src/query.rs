//! Query compiler: translates structured search options
//! into a parameterized, indexed lookup. A small `Fragment` builder
//! distinguishes identifier/column fragments (which may legitimately be
//! interpolated: column names and fixed comparators) from bound
//! values, so every user input reaches the store through a `?`
//! placeholder.

use anyhow::{bail, Context, Result};
use rusqlite::{types::Value, Connection};

use crate::mode::{parse_mode_query, ModeQuery};
use crate::store::records::Kind;

/// A location argument to `explain`/`usage`: `filename[:line[:column]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: String,
    pub line: Option<i64>,
    pub column: Option<i64>,
}

impl Location {
    pub fn parse(input: &str) -> Result<Location> {
        let mut parts = input.splitn(3, ':');
        let filename = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("empty location"))?
            .to_string();
        let line = parts
            .next()
            .map(|s| s.parse::<i64>().with_context(|| format!("invalid line in `{input}`")))
            .transpose()?;
        let column = parts
            .next()
            .map(|s| s.parse::<i64>().with_context(|| format!("invalid column in `{input}`")))
            .transpose()?;
        Ok(Location { filename, line, column })
    }
}

/// Which of `explain`/`usage` location mode is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationMode {
    /// Show every record at that point.
    Explain(Location),
    /// Show every record whose symbol appears anywhere at that point
    /// (a self-join subquery).
    Usage(Location),
}

/// Is `pattern` a GLOB pattern (contains any of `* ? [ ]`) or a literal?
pub fn is_pattern(pattern: &str) -> bool {
    pattern.chars().any(|c| matches!(c, '*' | '?' | '[' | ']'))
}

/// Structured, optional, AND-combined search inputs.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub symbol: Option<String>,
    pub path: Option<String>,
    pub kind: Option<Kind>,
    pub mode: Option<ModeQuery>,
    pub location: Option<LocationMode>,
}

impl SearchOptions {
    pub fn parse_mode(&mut self, raw: &str) -> Result<()> {
        self.mode = Some(parse_mode_query(raw)?);
        Ok(())
    }
}

/// A row projected by a search query (`file.name, line, column,
/// context, symbol, mode, kind` projection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRow {
    pub file: String,
    pub line: i64,
    pub column: i64,
    pub context: String,
    pub symbol: String,
    pub mode: u32,
    pub kind: char,
}

/// A bound parameter value for a `?` placeholder in a pushed clause.
/// The only things this builder ever splices as literal text are
/// column names and fixed comparators (`push_raw`, `ORDER BY`); every
/// user-supplied value travels through `Fragment::Bound`.
enum Fragment {
    Bound(Value),
}

#[derive(Default)]
struct QueryBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl QueryBuilder {
    fn push(&mut self, sql: &str, fragments: Vec<Fragment>) {
        let mut rendered = String::new();
        let mut next_arg = 0usize;
        for ch in sql.chars() {
            if ch == '?' {
                let Fragment::Bound(value) = &fragments[next_arg];
                self.params.push(value.clone());
                rendered.push('?');
                next_arg += 1;
            } else {
                rendered.push(ch);
            }
        }
        self.clauses.push(rendered);
    }

    fn push_raw(&mut self, sql: String) {
        self.clauses.push(sql);
    }
}

/// Compile `options` into a `(sql, params)` pair. Output is always
/// ordered `file.name, line, column` ascending, which the
/// renderer's lazy `%s` source-line reader depends on.
pub fn compile(options: &SearchOptions) -> Result<(String, Vec<Value>)> {
    if options.location.is_some() && options.symbol.is_some() {
        bail!("a location query (explain/usage) cannot be combined with a symbol pattern");
    }

    if let Some(location_mode) = &options.location {
        return compile_location(location_mode, options);
    }

    let mut builder = QueryBuilder::default();

    if let Some(symbol) = &options.symbol {
        if is_pattern(symbol) {
            builder.push("sindex.symbol GLOB ?", vec![Fragment::Bound(Value::Text(symbol.clone()))]);
        } else {
            builder.push("sindex.symbol = ?", vec![Fragment::Bound(Value::Text(symbol.clone()))]);
        }
    }

    push_common_filters(&mut builder, options);

    let where_clause = if builder.clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", builder.clauses.join(" AND "))
    };

    let sql = format!(
        "SELECT file.name, sindex.line, sindex.column, sindex.context, sindex.symbol, sindex.mode, sindex.kind \
         FROM sindex JOIN file ON file.id = sindex.file{where_clause} \
         ORDER BY file.name ASC, sindex.line ASC, sindex.column ASC"
    );

    Ok((sql, builder.params))
}

/// Append the `path`/`kind`/`mode` filters to `builder` as additional
/// AND-ed clauses. These filters are independent of location mode: they
/// apply the same way whether `builder` is collecting a plain symbol
/// query or an `explain`/`usage` location query.
fn push_common_filters(builder: &mut QueryBuilder, options: &SearchOptions) {
    if let Some(path) = &options.path {
        builder.push("file.name GLOB ?", vec![Fragment::Bound(Value::Text(path.clone()))]);
    }
    if let Some(kind) = &options.kind {
        builder.push("sindex.kind = ?", vec![Fragment::Bound(Value::Integer(kind.as_i64()))]);
    }
    if let Some(mode_query) = &options.mode {
        match mode_query {
            ModeQuery::ExactZero => builder.push_raw("sindex.mode = 0".to_string()),
            ModeQuery::ExactDef => {
                builder.push("sindex.mode = ?", vec![Fragment::Bound(Value::Integer(crate::mode::DEF as i64))]);
            }
            ModeQuery::AnyBit(mask) => {
                builder.push(
                    "(sindex.mode & ?) != 0",
                    vec![Fragment::Bound(Value::Integer(*mask as i64))],
                );
            }
        }
    }
}

fn compile_location(location_mode: &LocationMode, options: &SearchOptions) -> Result<(String, Vec<Value>)> {
    match location_mode {
        LocationMode::Explain(loc) => {
            let mut builder = QueryBuilder::default();
            builder.push("file.name = ?", vec![Fragment::Bound(Value::Text(loc.filename.clone()))]);
            if let Some(line) = loc.line {
                builder.push("sindex.line = ?", vec![Fragment::Bound(Value::Integer(line))]);
            }
            if let Some(column) = loc.column {
                builder.push("sindex.column = ?", vec![Fragment::Bound(Value::Integer(column))]);
            }
            push_common_filters(&mut builder, options);
            let sql = format!(
                "SELECT file.name, sindex.line, sindex.column, sindex.context, sindex.symbol, sindex.mode, sindex.kind \
                 FROM sindex JOIN file ON file.id = sindex.file \
                 WHERE {} \
                 ORDER BY file.name ASC, sindex.line ASC, sindex.column ASC",
                builder.clauses.join(" AND ")
            );
            Ok((sql, builder.params))
        }
        LocationMode::Usage(loc) => {
            let mut inner = QueryBuilder::default();
            inner.push("file.name = ?", vec![Fragment::Bound(Value::Text(loc.filename.clone()))]);
            if let Some(line) = loc.line {
                inner.push("sindex.line = ?", vec![Fragment::Bound(Value::Integer(line))]);
            }
            if let Some(column) = loc.column {
                inner.push("sindex.column = ?", vec![Fragment::Bound(Value::Integer(column))]);
            }
            let inner_where = inner.clauses.join(" AND ");

            let mut outer = QueryBuilder::default();
            outer.params = inner.params;
            let outer_symbol_clause = format!(
                "sindex.symbol IN (\
                 SELECT sindex.symbol FROM sindex JOIN file ON file.id = sindex.file WHERE {inner_where}\
                 )"
            );
            outer.clauses.push(outer_symbol_clause);
            push_common_filters(&mut outer, options);

            let sql = format!(
                "SELECT file.name, sindex.line, sindex.column, sindex.context, sindex.symbol, sindex.mode, sindex.kind \
                 FROM sindex JOIN file ON file.id = sindex.file \
                 WHERE {} \
                 ORDER BY file.name ASC, sindex.line ASC, sindex.column ASC",
                outer.clauses.join(" AND ")
            );
            Ok((sql, outer.params))
        }
    }
}

pub fn run(conn: &Connection, options: &SearchOptions) -> Result<Vec<SearchRow>> {
    let (sql, params) = compile(options)?;
    let mut stmt = conn.prepare(&sql).context("failed to prepare search query")?;
    let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
    let mut rows = stmt
        .query(params_refs.as_slice())
        .context("failed to run search query")?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_code: i64 = row.get(6)?;
        out.push(SearchRow {
            file: row.get(0)?,
            line: row.get(1)?,
            column: row.get(2)?,
            context: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            symbol: row.get(4)?,
            mode: row.get::<_, i64>(5)? as u32,
            kind: u8::try_from(kind_code).unwrap_or(b'?') as char,
        });
    }
    Ok(out)
}
