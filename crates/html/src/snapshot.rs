use crate::types::Node;
use std::fmt::{self, Write};

/// Deterministic, line-oriented rendering of a tree for test comparisons and
/// debugging output. Not a stable format.
///
/// - one line per node, two-space indentation per depth level
/// - attributes in source order, values quoted and escaped
/// - text and comments escaped so whitespace differences stay visible
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

impl DomSnapshot {
    pub fn new(root: &Node) -> Self {
        let mut lines = Vec::new();
        walk(root, 0, &mut lines);
        Self { lines }
    }

    /// Snapshot of the root's children only.
    pub fn of_children(root: &Node) -> Self {
        let mut lines = Vec::new();
        for child in root.children() {
            walk(child, 0, &mut lines);
        }
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn walk(node: &Node, depth: usize, out: &mut Vec<String>) {
    let mut line = "  ".repeat(depth);
    match node {
        Node::Element {
            name, attributes, ..
        } => {
            let _ = write!(&mut line, "<{name}");
            for (k, v) in attributes {
                let _ = write!(&mut line, " {k}=\"{}\"", escape(v));
            }
            line.push('>');
        }
        Node::Text { text } => {
            let _ = write!(&mut line, "\"{}\"", escape(text));
        }
        Node::Comment { text } => {
            let _ = write!(&mut line, "<!-- {} -->", escape(text));
        }
    }
    out.push(line);
    for child in node.children() {
        walk(child, depth + 1, out);
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Serializes a node (and its subtree) back to markup.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_html(node, &mut out);
    out
}

/// Serializes only the children of `node`.
pub fn inner_html(node: &Node) -> String {
    let mut out = String::new();
    for child in node.children() {
        write_html(child, &mut out);
    }
    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Element {
            name,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (k, v) in attributes {
                out.push(' ');
                out.push_str(k);
                if !v.is_empty() {
                    out.push_str("=\"");
                    escape_into(v, true, out);
                    out.push('"');
                }
            }
            out.push('>');
            if crate::tokenizer::is_void_element(name) {
                return;
            }
            let raw = matches!(name.as_ref(), "script" | "style");
            for child in children {
                match child {
                    Node::Text { text } if raw => out.push_str(text),
                    _ => write_html(child, out),
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Text { text } => escape_into(text, false, out),
        Node::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_builder::build;

    #[test]
    fn snapshot_lines_are_indented_per_depth() {
        let tree = build(r#"<ul class="a"><li>one</li><!--c--></ul>"#);
        let snap = DomSnapshot::of_children(&tree);
        assert_eq!(
            snap.as_lines(),
            &[
                r#"<ul class="a">"#.to_string(),
                "  <li>".to_string(),
                "    \"one\"".to_string(),
                "  <!-- c -->".to_string(),
            ]
        );
    }

    #[test]
    fn html_serialization_round_trips_through_the_builder() {
        let markup = r#"<div id="x" hidden><p>a &amp; b</p><img src="i.png"><!--n--></div>"#;
        let tree = build(markup);
        assert_eq!(inner_html(&tree), markup);
        assert_eq!(build(&inner_html(&tree)), tree);
    }

    #[test]
    fn script_text_is_not_escaped() {
        let tree = build("<style>a > b {}</style>");
        assert_eq!(inner_html(&tree), "<style>a > b {}</style>");
    }
}
