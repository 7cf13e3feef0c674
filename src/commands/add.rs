//! `add`: forward every tail argument to the C
//! frontend, staging every normalized record and committing it in one
//! transaction at end-of-run.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::frontend::{self, c::CFrontend};
use crate::registry::FileRegistry;
use crate::reporter::Sink;
use crate::store::{staging, Store};

pub fn run(config: &Config, include_local_syms: bool, files: &[String]) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("add: no input files given");
    }

    let mut store = Store::open(&config.db_path).context("failed to open store")?;
    let streams = frontend::init_streams(files);
    let mut registry = FileRegistry::new(config.project_root.clone(), include_local_syms);

    staging::open(&store.conn).context("failed to open staging table")?;

    let mut files_indexed = 0usize;
    for stream in &streams {
        registry
            .ensure(&mut store, stream.index, &stream.path)
            .with_context(|| format!("failed to register {}", stream.path.display()))?;

        if registry.is_ignored(stream.index) {
            warn!(path = %stream.path.display(), "ignoring file outside project root");
            continue;
        }

        let source = std::fs::read_to_string(&stream.path)
            .with_context(|| format!("failed to read {}", stream.path.display()))?;

        let mut sink = Sink::new(&store.conn, &registry);
        let mut c_frontend = CFrontend::new(stream.index, &source);
        c_frontend
            .run(&mut sink)
            .with_context(|| format!("failed to analyze {}", stream.path.display()))?;

        files_indexed += 1;
    }

    let merged = staging::commit(&mut store)?;
    info!(files_indexed, merged, "add complete");
    Ok(())
}
