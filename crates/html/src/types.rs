use std::sync::Arc;

/// Structural kind of a node, shared by template and live trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

/// Template tree node.
///
/// Element names are canonical ASCII-lowercase. Attribute order follows the
/// markup; valueless attributes carry the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn element(name: &str, attributes: Vec<(Arc<str>, String)>, children: Vec<Node>) -> Self {
        Node::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Node::Comment { text: text.into() }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element { .. } => NodeKind::Element,
            Node::Text { .. } => NodeKind::Text,
            Node::Comment { .. } => NodeKind::Comment,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[(Arc<str>, String)] {
        match self {
            Node::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes().iter().any(|(k, _)| k.as_ref() == name)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants (comments excluded
    /// below the top level, as the DOM does).
    pub fn text_content(&self) -> String {
        match self {
            Node::Text { text } | Node::Comment { text } => text.clone(),
            Node::Element { children, .. } => {
                let mut out = String::new();
                collect_text(children, &mut out);
                out
            }
        }
    }

    /// Content used for leaf comparison: the text content when the node has no
    /// children, otherwise `None`.
    pub fn leaf_content(&self) -> Option<String> {
        if self.children().is_empty() {
            Some(self.text_content())
        } else {
            None
        }
    }

    /// Depth-first search for an element with the given name.
    pub fn contains_element(&self, name: &str) -> bool {
        self.count_elements(name) > 0
    }

    pub fn count_elements(&self, name: &str) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.tag() == Some(name) {
                count += 1;
            }
            stack.extend(node.children());
        }
        count
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for n in nodes {
        match n {
            Node::Text { text } => out.push_str(text),
            Node::Element { children, .. } => collect_text(children, out),
            Node::Comment { .. } => {}
        }
    }
}
