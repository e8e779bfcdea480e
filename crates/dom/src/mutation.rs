//! Mutation journal entries.
//!
//! Every effective change to a `LiveDom` is described by exactly one
//! `Mutation`. Writes that leave the tree unchanged (setting an attribute to
//! its current value, clearing an empty node) are not mutations.
//!
//! Invariants:
//! - Entries are recorded in application order.
//! - `NodeId`s refer to the node at the time of the mutation; a removed id is
//!   stale for every later entry.
//! - Cloning a template subtree is a single `Create` for its root.

use crate::node::NodeId;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormProperty {
    Value,
    Checked,
    Selected,
}

impl FormProperty {
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "value" => Some(FormProperty::Value),
            "checked" => Some(FormProperty::Checked),
            "selected" => Some(FormProperty::Selected),
            _ => None,
        }
    }

    pub fn attribute_name(self) -> &'static str {
        match self {
            FormProperty::Value => "value",
            FormProperty::Checked => "checked",
            FormProperty::Selected => "selected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// A detached node (or cloned subtree) was created.
    Create { node: NodeId },
    /// A detached node was inserted; `before: None` appends.
    Insert {
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    },
    /// An attached node was relocated, keeping its identity and state.
    Move {
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    },
    /// A fragment's children were inserted as one batch.
    InsertFragment {
        parent: NodeId,
        nodes: Vec<NodeId>,
        before: Option<NodeId>,
    },
    /// A node and its subtree were removed and freed.
    Remove { node: NodeId },
    /// All children of a node were removed and freed.
    ClearChildren { node: NodeId },
    SetAttribute {
        node: NodeId,
        name: Arc<str>,
        value: String,
    },
    RemoveAttribute { node: NodeId, name: Arc<str> },
    SetText { node: NodeId, text: String },
    SetValue { node: NodeId, value: String },
    SetChecked { node: NodeId, checked: bool },
    SetSelected { node: NodeId, selected: bool },
}

impl Mutation {
    /// The node the mutation primarily targets.
    pub fn target(&self) -> NodeId {
        match self {
            Mutation::Create { node }
            | Mutation::Remove { node }
            | Mutation::ClearChildren { node }
            | Mutation::SetAttribute { node, .. }
            | Mutation::RemoveAttribute { node, .. }
            | Mutation::SetText { node, .. }
            | Mutation::SetValue { node, .. }
            | Mutation::SetChecked { node, .. }
            | Mutation::SetSelected { node, .. } => *node,
            Mutation::Insert { parent, .. }
            | Mutation::Move { parent, .. }
            | Mutation::InsertFragment { parent, .. } => *parent,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::Insert { .. }
                | Mutation::Move { .. }
                | Mutation::InsertFragment { .. }
                | Mutation::Remove { .. }
                | Mutation::ClearChildren { .. }
        )
    }
}
