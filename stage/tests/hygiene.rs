//! Hygiene: source-level budgets for the engine library.
//!
//! The tick loop must never abort on a recoverable condition, so library code
//! propagates `EngineError` instead of panicking or dropping errors. These
//! tests scan `stage/src/` for the patterns that break that rule. Each has a
//! budget, and budgets only go down.

use std::fs;
use std::path::{Path, PathBuf};

struct Budget {
    pattern: &'static str,
    max: usize,
    hint: &'static str,
}

/// Patterns that abort the process.
const PANICS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, hint: "propagate with `?`" },
    Budget { pattern: ".expect(", max: 0, hint: "propagate with `?`" },
    Budget { pattern: "panic!(", max: 0, hint: "return an EngineError" },
    Budget { pattern: "unreachable!(", max: 0, hint: "make the state unrepresentable" },
    Budget { pattern: "todo!(", max: 0, hint: "finish it" },
    Budget { pattern: "unimplemented!(", max: 0, hint: "finish it" },
];

/// Patterns that drop an error without looking at it.
const DISCARDS: &[Budget] = &[
    Budget { pattern: "let _ =", max: 0, hint: "log or propagate" },
    Budget { pattern: ".ok()", max: 0, hint: "match on the error" },
];

const STRUCTURE: &[Budget] = &[
    Budget { pattern: "#[allow(dead_code)]", max: 0, hint: "delete it" },
    // Also matches eprintln!.
    Budget { pattern: "println!(", max: 0, hint: "use tracing" },
];

/// Module files that have no sibling `_test.rs`.
const UNTESTED_MODULES: &[&str] = &["consts.rs", "error.rs", "lib.rs", "web.rs"];

struct SourceFile {
    path: PathBuf,
    content: String,
}

/// Production `.rs` files under `stage/src/`, excluding `*_test.rs`.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    assert!(!files.is_empty(), "no sources found; run from the stage crate root");
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let is_source = path.extension().is_some_and(|e| e == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_source && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path, content });
            }
        }
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

fn check(budgets: &[Budget]) {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in budgets {
        let hits: Vec<(String, usize)> = files
            .iter()
            .filter_map(|file| {
                let count = file.content.lines().filter(|l| !is_comment(l) && l.contains(budget.pattern)).count();
                (count > 0).then(|| (file.path.display().to_string(), count))
            })
            .collect();
        let count: usize = hits.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            let listing: Vec<String> = hits.iter().map(|(path, c)| format!("  {path}: {c}")).collect();
            failures.push(format!(
                "`{}` budget exceeded: found {count}, max {} ({}).\n{}",
                budget.pattern,
                budget.max,
                budget.hint,
                listing.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

// =============================================================================
// Budgets
// =============================================================================

#[test]
fn panic_budgets() {
    check(PANICS);
}

#[test]
fn discard_budgets() {
    check(DISCARDS);
}

#[test]
fn structure_budgets() {
    check(STRUCTURE);
}

// =============================================================================
// Test layout
// =============================================================================

#[test]
fn modules_have_sibling_tests() {
    let missing: Vec<String> = source_files()
        .iter()
        .filter_map(|file| {
            let name = file.path.file_name()?.to_string_lossy().into_owned();
            if UNTESTED_MODULES.contains(&name.as_str()) {
                return None;
            }
            let sibling = file.path.with_file_name(name.replace(".rs", "_test.rs"));
            let wired = file.content.contains(&format!("#[path = \"{}\"]", name.replace(".rs", "_test.rs")));
            (!sibling.exists() || !wired).then_some(name)
        })
        .collect();
    assert!(missing.is_empty(), "modules without a wired sibling test: {missing:?}");
}
