//! Shared helpers for the workspace's test suites: readable line diffs and
//! TOML-described reconciliation fixtures.

pub mod fixtures;

use std::fmt::Write;

pub use fixtures::{CaseOutcome, FixtureError, ReconcileCase, load_cases, parse_cases};

/// Describes the first differing line (with two lines of context) between two
/// line-oriented renderings. Returns an empty string when they are equal.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    if expected == actual {
        return String::new();
    }
    let missing = "<missing>";
    let max = expected.len().max(actual.len());
    let first = (0..max)
        .find(|&i| expected.get(i) != actual.get(i))
        .unwrap_or(max);

    let mut out = String::new();
    let start = first.saturating_sub(2);
    let end = (first + 3).min(max);
    let _ = writeln!(
        &mut out,
        "first mismatch at line {} (showing {}..={}):",
        first + 1,
        start + 1,
        end
    );
    for i in start..end {
        let left = expected.get(i).map(String::as_str).unwrap_or(missing);
        let right = actual.get(i).map(String::as_str).unwrap_or(missing);
        let marker = if i == first { ">" } else { " " };
        let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", i + 1);
        let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", i + 1);
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn equal_inputs_produce_no_diff() {
        assert_eq!(diff_lines(&lines(&["a", "b"]), &lines(&["a", "b"])), "");
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let out = diff_lines(&lines(&["a", "b", "c"]), &lines(&["a", "x", "c"]));
        assert!(out.starts_with("first mismatch at line 2"), "{out}");
        assert!(out.contains(">    2  expected: b"), "{out}");
        assert!(out.contains(">    2    actual: x"), "{out}");
    }

    #[test]
    fn diff_reports_length_mismatch() {
        let out = diff_lines(&lines(&["a"]), &lines(&["a", "b"]));
        assert!(out.contains("expected: <missing>"), "{out}");
        assert!(out.contains("expected 1 lines, actual 2 lines"), "{out}");
    }
}
