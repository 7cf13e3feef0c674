//! Run configuration: project root, store path, and verbosity, built
//! once by CLI parsing (`cli::Cli`) and passed by reference into each
//! subsystem rather than read from global mutable state.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_DB_FILENAME: &str = "sindex.sqlite";
pub const DATABASE_ENV_VAR: &str = "SINDEX_DATABASE";

#[derive(Debug, Clone)]
pub struct Config {
    /// The working directory at invocation time, canonicalized. Source
    /// paths not strictly under it are excluded (the "project root"
    /// locality rule).
    pub project_root: PathBuf,
    pub db_path: PathBuf,
    pub verbose: bool,
}

impl Config {
    /// `SINDEX_DATABASE` overrides the default store path; a CLI
    /// `-D/--database` flag is narrower still and takes precedence over
    /// the environment, since a flag given at the call site is more
    /// specific than ambient environment.
    pub fn resolve(cli_database_override: Option<PathBuf>, verbose: bool) -> Result<Config> {
        let project_root =
            env::current_dir().context("failed to read current directory")?;
        let project_root = project_root
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {}", project_root.display()))?;

        let db_path = cli_database_override
            .or_else(|| env::var_os(DATABASE_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME));

        let db_path = if db_path.is_absolute() {
            db_path
        } else {
            project_root.join(db_path)
        };

        Ok(Config {
            project_root,
            db_path,
            verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // SINDEX_DATABASE/env::current_dir are process-global; serialize
    // the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn cli_override_wins_over_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(DATABASE_ENV_VAR, "from-env.sqlite");
        let config = Config::resolve(Some(PathBuf::from("from-cli.sqlite")), false).unwrap();
        env::remove_var(DATABASE_ENV_VAR);
        assert_eq!(config.db_path.file_name().unwrap(), "from-cli.sqlite");
    }

    #[test]
    fn env_wins_over_default_when_no_cli_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(DATABASE_ENV_VAR, "from-env.sqlite");
        let config = Config::resolve(None, false).unwrap();
        env::remove_var(DATABASE_ENV_VAR);
        assert_eq!(config.db_path.file_name().unwrap(), "from-env.sqlite");
    }

    #[test]
    fn default_db_filename_used_when_nothing_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var(DATABASE_ENV_VAR);
        let config = Config::resolve(None, false).unwrap();
        assert_eq!(config.db_path.file_name().unwrap(), DEFAULT_DB_FILENAME);
    }
}
