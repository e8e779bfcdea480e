//! Template tree construction.
//!
//! Builds a single `body`-rooted tree from markup. The builder keeps separate
//! head and body partitions while parsing (head-only elements seen before any
//! body content go to the head), then relocates the head children, in order,
//! to the front of the body so consumers only ever see one flat child list.
//!
//! Construction is best-effort and infallible: stray end tags are ignored,
//! unclosed elements are closed at end of input, and a few implied end tags
//! (`p`, `li`, `option`, table rows/cells, `dt`/`dd`) are honoured.

use crate::tokenizer::tokenize;
use crate::types::{Node, Token};
use std::sync::Arc;

const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "template", "title",
];

const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Parses markup into a `body` element holding the whole template.
pub fn build(markup: &str) -> Node {
    build_from_tokens(tokenize(markup))
}

pub fn build_from_tokens(tokens: Vec<Token>) -> Node {
    let mut builder = TreeBuilder::new();
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Head,
    Body,
}

/// Counters for a single build, logged with the `debug-stats` feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeBuilderStats {
    pub tokens: usize,
    pub nodes: usize,
    pub relocated_head_children: usize,
    pub ignored_end_tags: usize,
    pub max_depth: usize,
}

#[derive(Debug)]
pub struct TreeBuilder {
    arena: NodeArena,
    head: usize,
    body: usize,
    phase: Phase,
    open: Vec<usize>,
    stats: TreeBuilderStats,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let mut arena = NodeArena::default();
        let head = arena.push(ArenaNode::element("head".into(), Vec::new()));
        let body = arena.push(ArenaNode::element("body".into(), Vec::new()));
        Self {
            arena,
            head,
            body,
            phase: Phase::Head,
            open: Vec::new(),
            stats: TreeBuilderStats::default(),
        }
    }

    pub fn stats(&self) -> TreeBuilderStats {
        self.stats
    }

    fn current_parent(&self) -> usize {
        match self.open.last() {
            Some(&index) => index,
            None if self.phase == Phase::Head => self.head,
            None => self.body,
        }
    }

    fn enter_body(&mut self) {
        if self.phase == Phase::Head {
            self.phase = Phase::Body;
            self.open.clear();
        }
    }

    fn at_head_level(&self) -> bool {
        self.phase == Phase::Head && self.open.is_empty()
    }

    pub fn push(&mut self, token: Token) {
        self.stats.tokens += 1;
        match token {
            Token::Doctype(_) => {}
            Token::Comment(text) => {
                let parent = self.current_parent();
                self.arena.add_child(parent, ArenaNode::Comment(text));
            }
            Token::Text(text) => self.text(text),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing),
            Token::EndTag(name) => self.end_tag(&name),
        }
    }

    fn text(&mut self, text: String) {
        let text = if self.at_head_level() {
            let trimmed = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.is_empty() {
                return;
            }
            self.enter_body();
            trimmed.to_string()
        } else {
            text
        };
        let parent = self.current_parent();
        self.arena.add_child(parent, ArenaNode::Text(text));
    }

    fn start_tag(&mut self, name: String, attributes: Vec<(String, String)>, self_closing: bool) {
        match name.as_str() {
            "html" | "head" => return,
            "body" => {
                self.enter_body();
                return;
            }
            _ => {}
        }

        if self.at_head_level() && !HEAD_ELEMENTS.contains(&name.as_str()) {
            self.enter_body();
        }
        if self.phase == Phase::Body {
            self.close_implied(&name);
        }

        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (Arc::<str>::from(k), v))
            .collect();
        let parent = self.current_parent();
        let index = self
            .arena
            .add_child(parent, ArenaNode::element(Arc::from(name), attributes));
        if !self_closing {
            self.open.push(index);
            self.stats.max_depth = self.stats.max_depth.max(self.open.len());
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" => return,
            "head" => {
                self.enter_body();
                return;
            }
            _ => {}
        }
        match self.open.iter().rposition(|&i| self.arena.is_element_named(i, name)) {
            Some(pos) => self.open.truncate(pos),
            None => self.stats.ignored_end_tags += 1,
        }
    }

    fn close_implied(&mut self, name: &str) {
        let family: &[&str] = match name {
            "li" => &["li"],
            "dt" | "dd" => &["dt", "dd"],
            "option" => &["option"],
            "tr" => &["tr", "td", "th"],
            "td" | "th" => &["td", "th"],
            _ => &[],
        };
        while let Some(&top) = self.open.last() {
            if family.iter().any(|f| self.arena.is_element_named(top, f)) {
                self.open.pop();
            } else {
                break;
            }
        }
        if CLOSES_PARAGRAPH.contains(&name) {
            if let Some(pos) = self.open.iter().rposition(|&i| self.arena.is_element_named(i, "p")) {
                self.open.truncate(pos);
            }
        }
    }

    /// Relocates head children to the front of the body and materializes the tree.
    pub fn finish(mut self) -> Node {
        let head_children = self.arena.take_children(self.head);
        self.stats.relocated_head_children = head_children.len();
        self.arena.prepend_children(self.body, head_children);
        self.stats.nodes = self.arena.nodes.len().saturating_sub(1);

        #[cfg(feature = "debug-stats")]
        log::debug!(target: "html.tree_builder", "build stats: {:?}", self.stats);

        self.arena.into_tree(self.body)
    }
}

#[derive(Debug)]
enum ArenaNode {
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        children: Vec<usize>,
    },
    Text(String),
    Comment(String),
}

impl ArenaNode {
    fn element(name: Arc<str>, attributes: Vec<(Arc<str>, String)>) -> Self {
        ArenaNode::Element {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn children(&self) -> &[usize] {
        match self {
            ArenaNode::Element { children, .. } => children,
            ArenaNode::Text(_) | ArenaNode::Comment(_) => &[],
        }
    }
}

#[derive(Debug, Default)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    fn push(&mut self, node: ArenaNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn children_of(&mut self, parent: usize) -> &mut Vec<usize> {
        match &mut self.nodes[parent] {
            ArenaNode::Element { children, .. } => children,
            _ => unreachable!("tree builder parents are always elements"),
        }
    }

    fn add_child(&mut self, parent: usize, child: ArenaNode) -> usize {
        let index = self.push(child);
        self.children_of(parent).push(index);
        index
    }

    fn take_children(&mut self, parent: usize) -> Vec<usize> {
        std::mem::take(self.children_of(parent))
    }

    fn prepend_children(&mut self, parent: usize, mut front: Vec<usize>) {
        let children = self.children_of(parent);
        front.append(children);
        *children = front;
    }

    fn is_element_named(&self, index: usize, target: &str) -> bool {
        matches!(&self.nodes[index], ArenaNode::Element { name, .. } if name.as_ref() == target)
    }

    /// Iterative post-order materialization; deep nesting cannot overflow the stack.
    fn into_tree(self, root: usize) -> Node {
        let mut slots: Vec<Option<ArenaNode>> = self.nodes.into_iter().map(Some).collect();
        let mut built: Vec<Node> = Vec::new();
        let mut stack = vec![(root, false)];

        while let Some((index, children_done)) = stack.pop() {
            if !children_done {
                stack.push((index, true));
                if let Some(node) = &slots[index] {
                    stack.extend(node.children().iter().rev().map(|&child| (child, false)));
                }
                continue;
            }
            let Some(node) = slots[index].take() else {
                continue;
            };
            let node = match node {
                ArenaNode::Element {
                    name,
                    attributes,
                    children,
                } => {
                    let children = built.split_off(built.len() - children.len());
                    Node::Element {
                        name,
                        attributes,
                        children,
                    }
                }
                ArenaNode::Text(text) => Node::Text { text },
                ArenaNode::Comment(text) => Node::Comment { text },
            };
            built.push(node);
        }

        built.pop().unwrap_or_else(|| Node::element("body", Vec::new(), Vec::new()))
    }
}
