//! TOML fixture format for reconciliation cases.
//!
//! ```toml
//! [[case]]
//! name = "reorder by tag"
//! live = "<p>a</p><div>b</div>"
//! template = "<div>b</div><p>a</p>"
//! expected = "<div>b</div><p>a</p>"
//!
//! [[case]]
//! name = "script is refused"
//! live = "<p>a</p>"
//! template = "<p>a</p><script>x()</script>"
//! outcome = "script-injection"
//! ```
//!
//! `expected` is the live root's inner markup after the pass; when omitted the
//! template's own serialization is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseOutcome {
    #[default]
    Rendered,
    ScriptInjection,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcileCase {
    pub name: String,
    pub live: String,
    pub template: String,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub allow_inline_events: bool,
    #[serde(default)]
    pub outcome: CaseOutcome,
    /// Upper bound on mutations a second, identical pass may produce.
    #[serde(default)]
    pub max_repeat_mutations: usize,
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    #[serde(default, rename = "case")]
    cases: Vec<ReconcileCase>,
}

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    DuplicateName(String),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::Io(err) => write!(f, "failed to read fixture file: {err}"),
            FixtureError::Toml(err) => write!(f, "invalid fixture file: {err}"),
            FixtureError::DuplicateName(name) => write!(f, "duplicate case name: {name}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<std::io::Error> for FixtureError {
    fn from(err: std::io::Error) -> Self {
        FixtureError::Io(err)
    }
}

impl From<toml::de::Error> for FixtureError {
    fn from(err: toml::de::Error) -> Self {
        FixtureError::Toml(err)
    }
}

pub fn parse_cases(source: &str) -> Result<Vec<ReconcileCase>, FixtureError> {
    let file: CaseFile = toml::from_str(source)?;
    let mut seen = std::collections::HashSet::new();
    for case in &file.cases {
        if !seen.insert(case.name.as_str()) {
            return Err(FixtureError::DuplicateName(case.name.clone()));
        }
    }
    Ok(file.cases)
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<ReconcileCase>, FixtureError> {
    let source = std::fs::read_to_string(path)?;
    parse_cases(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cases_with_defaults() {
        let cases = parse_cases(
            r#"
            [[case]]
            name = "one"
            live = "<p>a</p>"
            template = "<p>b</p>"

            [[case]]
            name = "two"
            live = ""
            template = "<script></script>"
            outcome = "script-injection"
            allow_inline_events = true
            "#,
        )
        .expect("valid fixture");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].outcome, CaseOutcome::Rendered);
        assert_eq!(cases[0].expected, None);
        assert!(!cases[0].allow_inline_events);
        assert_eq!(cases[1].outcome, CaseOutcome::ScriptInjection);
        assert!(cases[1].allow_inline_events);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = parse_cases(
            r#"
            [[case]]
            name = "same"
            live = ""
            template = ""

            [[case]]
            name = "same"
            live = ""
            template = ""
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, FixtureError::DuplicateName(name) if name == "same"));
    }

    #[test]
    fn cases_serialize_with_kebab_case_outcome() {
        let case = ReconcileCase {
            name: "n".into(),
            live: String::new(),
            template: String::new(),
            expected: None,
            allow_inline_events: false,
            outcome: CaseOutcome::ScriptInjection,
            max_repeat_mutations: 0,
        };
        let json = serde_json::to_value(&case).expect("serializable");
        assert_eq!(json["outcome"], "script-injection");
    }
}
