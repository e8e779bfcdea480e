use html::NodeKind;
use std::fmt;
use std::sync::Arc;

/// Generational handle into a `LiveDom` arena.
///
/// Slots are recycled after removal with a bumped generation, so a handle to a
/// removed node never aliases a node created later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

/// Live form state, following the DOM dirty-flag model: each property reflects
/// its attribute until written, after which the written value wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub(crate) value: Option<String>,
    pub(crate) checked: Option<bool>,
    pub(crate) selected: Option<bool>,
}

impl FormState {
    pub fn is_value_dirty(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_checked_dirty(&self) -> bool {
        self.checked.is_some()
    }

    pub fn is_selected_dirty(&self) -> bool {
        self.selected.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub(crate) name: Arc<str>,
    pub(crate) attributes: Vec<(Arc<str>, String)>,
    pub(crate) form: FormState,
}

impl ElementData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(Arc<str>, String)] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
    /// Detached batching container; its children move out when it is inserted.
    Fragment,
}

impl NodeData {
    /// Template-visible kind; fragments have none.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            NodeData::Element(_) => Some(NodeKind::Element),
            NodeData::Text(_) => Some(NodeKind::Text),
            NodeData::Comment(_) => Some(NodeKind::Comment),
            NodeData::Fragment => None,
        }
    }

    pub fn allows_children(&self) -> bool {
        matches!(self, NodeData::Element(_) | NodeData::Fragment)
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}
