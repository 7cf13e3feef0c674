//! `rm`: delete every file record matching any of
//! the given GLOB patterns; cascade clears their index records.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::store::{remove, Store};

pub fn run(config: &Config, patterns: &[String]) -> Result<()> {
    let mut store = Store::open_existing(&config.db_path).context("failed to open store")?;
    let removed = remove::remove(&mut store, patterns)?;
    info!(removed, patterns = patterns.len(), "rm complete");
    Ok(())
}
