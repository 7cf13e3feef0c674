//! CLI surface, parsed with `clap`'s derive API. Everything downstream
//! of parsing stays in the same `anyhow`/`tracing` idiom as the rest of
//! the crate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sindex")]
#[command(about = "Persistent semantic index of C identifiers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Override the store path (defaults to `SINDEX_DATABASE`, else
    /// `sindex.sqlite`).
    #[arg(short = 'D', long = "database", global = true)]
    pub database: Option<PathBuf>,

    /// Raise the log filter to debug for this invocation. Accepted at
    /// the top level or on any subcommand.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index the given C source files.
    Add {
        /// Include local (function-scope/static) symbols in the index.
        #[arg(long)]
        include_local_syms: bool,

        /// Frontend options and files to index. Everything after the
        /// first non-option token is forwarded verbatim.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        files: Vec<String>,
    },

    /// Remove files (and their records, by cascade) matching a GLOB
    /// pattern.
    Rm {
        /// GLOB pattern(s) against the stored file name.
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Query the index.
    Search {
        /// Format template (default: `(%m) %f\t%l\t%c\t%C\t%s`).
        #[arg(short = 'f', long = "format")]
        format: Option<String>,

        /// GLOB against the stored file name.
        #[arg(short = 'p', long = "path")]
        path: Option<String>,

        /// Mode mask: `r`, `w`, `m`, `-`, `def`, or a 3-character form.
        #[arg(short = 'm', long = "mode")]
        mode: Option<String>,

        /// Kind filter: one of `s f v m`.
        #[arg(short = 'k', long = "kind")]
        kind: Option<char>,

        /// `explain(filename[:line[:column]])`: show every record at
        /// that point.
        #[arg(short = 'e', long = "explain", conflicts_with = "usage")]
        explain: bool,

        /// `usage(filename[:line[:column]])`: show every record whose
        /// symbol appears anywhere at that point.
        #[arg(short = 'l', long = "usage", conflicts_with = "explain")]
        usage: bool,

        /// A symbol pattern, or `filename[:line[:column]]` when `-e`/`-l`
        /// is given. Exactly one of pattern/location is accepted.
        query: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_trailing_files() {
        let cli = Cli::parse_from(["sindex", "add", "--include-local-syms", "a.c", "b.c"]);
        match cli.command {
            Command::Add { include_local_syms, files } => {
                assert!(include_local_syms);
                assert_eq!(files, vec!["a.c".to_string(), "b.c".to_string()]);
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn verbose_parses_globally_or_per_subcommand() {
        let cli = Cli::parse_from(["sindex", "-v", "rm", "*.c"]);
        assert!(cli.verbose);
        let cli = Cli::parse_from(["sindex", "rm", "-v", "*.c"]);
        assert!(cli.verbose);
    }

    #[test]
    fn database_override_parses() {
        let cli = Cli::parse_from(["sindex", "-D", "other.sqlite", "rm", "*.c"]);
        assert_eq!(cli.database, Some(PathBuf::from("other.sqlite")));
    }

    #[test]
    fn search_parses_options_and_pattern() {
        let cli = Cli::parse_from(["sindex", "search", "-k", "v", "-m", "r", "x"]);
        match cli.command {
            Command::Search { kind, mode, query, .. } => {
                assert_eq!(kind, Some('v'));
                assert_eq!(mode, Some("r".to_string()));
                assert_eq!(query, Some("x".to_string()));
            }
            other => panic!("expected Search, got {other:?}"),
        }
    }

    #[test]
    fn explain_and_usage_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["sindex", "search", "-e", "-l", "a.c:1:1"]);
        assert!(result.is_err());
    }
}
