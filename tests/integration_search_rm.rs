//! End-to-end `rm` cascade and the query compiler/renderer working
//! together against a real indexed project.

use std::fs;

use sindex::commands::{add, rm};
use sindex::config::Config;
use sindex::query::{self, Location, LocationMode, SearchOptions};
use sindex::render::{self, Format};
use sindex::store::Store;

fn config_for(root: &std::path::Path) -> Config {
    Config {
        project_root: fs::canonicalize(root).unwrap(),
        db_path: root.join("sindex.sqlite"),
        verbose: false,
    }
}

#[test]
fn rm_cascades_to_index_records_but_leaves_other_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.c");
    let b = dir.path().join("b.c");
    fs::write(&a, "int x;\n").unwrap();
    fs::write(&b, "int y;\n").unwrap();

    let config = config_for(dir.path());
    add::run(
        &config,
        true,
        &[a.to_string_lossy().to_string(), b.to_string_lossy().to_string()],
    )
    .unwrap();

    rm::run(&config, &["a.c".to_string()]).unwrap();

    let store = Store::open(&config.db_path).unwrap();
    let rows = query::run(store.connection(), &SearchOptions::default()).unwrap();
    assert!(rows.iter().all(|r| r.file != "a.c"));
    assert!(rows.iter().any(|r| r.file == "b.c" && r.symbol == "y"));
}

#[test]
fn rm_glob_pattern_removes_every_matching_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.c");
    let b = dir.path().join("b.c");
    let header = dir.path().join("util.h");
    fs::write(&a, "int x;\n").unwrap();
    fs::write(&b, "int y;\n").unwrap();
    fs::write(&header, "int z;\n").unwrap();

    let config = config_for(dir.path());
    add::run(
        &config,
        true,
        &[
            a.to_string_lossy().to_string(),
            b.to_string_lossy().to_string(),
            header.to_string_lossy().to_string(),
        ],
    )
    .unwrap();

    rm::run(&config, &["*.c".to_string()]).unwrap();

    let store = Store::open(&config.db_path).unwrap();
    let rows = query::run(store.connection(), &SearchOptions::default()).unwrap();
    assert!(rows.iter().all(|r| r.file == "util.h"));
    assert!(rows.iter().any(|r| r.symbol == "z"));
}

#[test]
fn search_filters_and_renders_against_a_real_index() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.c");
    fs::write(&a, "int counter;\nint bump(void) {\n  counter = counter + 1;\n  return counter;\n}\n").unwrap();

    let config = config_for(dir.path());
    add::run(&config, true, &[a.to_string_lossy().to_string()]).unwrap();

    let store = Store::open(&config.db_path).unwrap();

    let mut opts = SearchOptions {
        symbol: Some("counter".to_string()),
        ..Default::default()
    };
    let rows = query::run(store.connection(), &opts).unwrap();
    assert!(rows.len() >= 2, "expected at least a def and a use of `counter`");

    opts.parse_mode("def").unwrap();
    let def_rows = query::run(store.connection(), &opts).unwrap();
    assert_eq!(def_rows.len(), 1);
    assert_eq!(def_rows[0].line, 1);

    let format = Format::parse("%n@%l:%c %k %m").unwrap();
    let mut out = Vec::new();
    render::render_all(&format, &def_rows, &config.project_root, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "counter@1:5 v def\n");
}

#[test]
fn explain_and_usage_locate_occurrences_through_a_real_index() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.c");
    fs::write(&a, "int counter;\nint bump(void) {\n  return counter;\n}\n").unwrap();

    let config = config_for(dir.path());
    add::run(&config, true, &[a.to_string_lossy().to_string()]).unwrap();

    let store = Store::open(&config.db_path).unwrap();

    let explain_opts = SearchOptions {
        location: Some(LocationMode::Explain(Location {
            filename: "a.c".to_string(),
            line: Some(1),
            column: Some(5),
        })),
        ..Default::default()
    };
    let explain_rows = query::run(store.connection(), &explain_opts).unwrap();
    assert_eq!(explain_rows.len(), 1);
    assert_eq!(explain_rows[0].symbol, "counter");

    let usage_opts = SearchOptions {
        location: Some(LocationMode::Usage(Location {
            filename: "a.c".to_string(),
            line: Some(1),
            column: Some(5),
        })),
        ..Default::default()
    };
    let usage_rows = query::run(store.connection(), &usage_opts).unwrap();
    assert!(usage_rows.len() >= 2);
    assert!(usage_rows.iter().all(|r| r.symbol == "counter"));
}
