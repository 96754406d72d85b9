//! Hygiene — enforces coding standards at test time
//!
//! Scans the production sources for constructs that could take down a host
//! page. A widget embedded in someone else's site must never panic, so every
//! budget is zero and stays zero.

use std::fs;
use std::path::{Path, PathBuf};

/// Production `.rs` files under `src/`, excluding sibling `*_test.rs` files.
fn production_sources() -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::from("src")];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "rs")
                && !path.to_string_lossy().ends_with("_test.rs")
            {
                if let Ok(content) = fs::read_to_string(&path) {
                    files.push((path, content));
                }
            }
        }
    }
    files
}

fn occurrences<'a>(
    files: &'a [(PathBuf, String)],
    pattern: &str,
) -> Vec<(&'a Path, usize)> {
    files
        .iter()
        .filter_map(|(path, content)| {
            let count = content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then_some((path.as_path(), count))
        })
        .collect()
}

fn assert_zero_budget(pattern: &str) {
    let files = production_sources();
    assert!(!files.is_empty(), "no production sources found under src/");
    let hits = occurrences(&files, pattern);
    let count: usize = hits.iter().map(|(_, c)| c).sum();
    let report = hits
        .iter()
        .map(|(path, c)| format!("  {}: {c}", path.display()))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(count == 0, "`{pattern}` budget exceeded: found {count}, max 0.\n{report}");
}

#[test]
fn no_unwrap_in_production_code() {
    assert_zero_budget(".unwrap()");
}

#[test]
fn no_expect_in_production_code() {
    assert_zero_budget(".expect(");
}

#[test]
fn no_panics_in_production_code() {
    assert_zero_budget("panic!(");
    assert_zero_budget("unreachable!(");
}

#[test]
fn no_stubs_in_production_code() {
    assert_zero_budget("todo!(");
    assert_zero_budget("unimplemented!(");
}

#[test]
fn no_dead_code_suppressions() {
    assert_zero_budget("#[allow(dead_code)]");
}
