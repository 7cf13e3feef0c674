//! `search`: compile CLI options into a
//! `SearchOptions`, run the query compiler, and render the results.

use anyhow::{anyhow, bail, Context, Result};

use crate::config::Config;
use crate::query::{self, Location, LocationMode, SearchOptions};
use crate::render::{self, Format};
use crate::store::records::Kind;
use crate::store::Store;

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &Config,
    format: Option<String>,
    path: Option<String>,
    mode: Option<String>,
    kind: Option<char>,
    explain: bool,
    usage: bool,
    query_arg: Option<String>,
) -> Result<()> {
    // Exactly one of a symbol pattern and a location is required: the
    // CLI layer never treats an absent query as an implicit
    // match-everything.
    let Some(query_arg) = query_arg else {
        bail!("search requires exactly one of PATTERN or LOC (filename[:line[:column]])");
    };

    let mut options = SearchOptions::default();

    if explain || usage {
        let location = Location::parse(&query_arg)
            .with_context(|| format!("invalid location `{query_arg}`"))?;
        options.location = Some(if explain {
            LocationMode::Explain(location)
        } else {
            LocationMode::Usage(location)
        });
    } else {
        options.symbol = Some(query_arg);
    }

    options.path = path;

    if let Some(kind_code) = kind {
        options.kind = Some(
            Kind::from_code(kind_code).ok_or_else(|| anyhow!("invalid kind `{kind_code}`: expected one of s f v m"))?,
        );
    }

    if let Some(mode_str) = mode {
        options.parse_mode(&mode_str)?;
    }

    let store = Store::open_existing(&config.db_path).context("failed to open store")?;
    let rows = query::run(&store.conn, &options)?;

    let template = format.as_deref().unwrap_or(render::DEFAULT_FORMAT);
    let compiled = Format::parse(template).with_context(|| format!("invalid format string `{template}`"))?;

    let stdout = std::io::stdout();
    render::render_all(&compiled, &rows, &config.project_root, stdout.lock())?;
    Ok(())
}
