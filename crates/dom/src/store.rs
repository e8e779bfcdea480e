use crate::mutation::Mutation;
use crate::node::{ElementData, FormState, NodeData, NodeId, NodeRecord};
use html::{Node, NodeKind};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    StaleNode(NodeId),
    WrongNodeKind(NodeId),
    NotAParent(NodeId),
    NotAChild { parent: NodeId, child: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
    RootIsFixed(NodeId),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::StaleNode(id) => write!(f, "node {id} does not exist (removed or foreign)"),
            DomError::WrongNodeKind(id) => write!(f, "node {id} has the wrong kind for this operation"),
            DomError::NotAParent(id) => write!(f, "node {id} cannot have children"),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            DomError::RootIsFixed(id) => write!(f, "root node {id} cannot be moved or removed"),
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<NodeRecord>,
}

/// The persistent, mutable tree a render targets.
///
/// Nodes live in a generational arena and are addressed by `NodeId`. The root
/// element is created with the tree and can never be moved or removed; every
/// other node is created detached and attached with `append_child` /
/// `insert_before`.
///
/// Each effective change bumps `mutation_count`; when the journal is enabled
/// the change is also recorded as a `Mutation`.
#[derive(Debug)]
pub struct LiveDom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    journal: Option<Vec<Mutation>>,
    mutation_count: u64,
}

impl Default for LiveDom {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveDom {
    pub fn new() -> Self {
        Self::with_root("body")
    }

    pub fn with_root(name: &str) -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            journal: None,
            mutation_count: 0,
        };
        dom.root = dom.alloc(NodeData::Element(new_element(name, Vec::new())));
        dom
    }

    /// Builds a live tree whose root children are parsed from `markup`.
    /// Seeding is not counted as mutation.
    pub fn from_markup(markup: &str) -> Self {
        let tree = html::build(markup);
        let mut dom = Self::new();
        for child in tree.children() {
            let id = dom.import(child);
            let root = dom.root;
            dom.attach(root, id, None);
        }
        dom.mutation_count = 0;
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live (allocated) nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn enable_journal(&mut self) {
        if self.journal.is_none() {
            self.journal = Some(Vec::new());
        }
    }

    pub fn disable_journal(&mut self) {
        self.journal = None;
    }

    pub fn mutations(&self) -> &[Mutation] {
        self.journal.as_deref().unwrap_or(&[])
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    fn log(&mut self, mutation: Mutation) {
        self.mutation_count += 1;
        log::trace!(target: "dom", "mutation: {mutation:?}");
        if let Some(journal) = &mut self.journal {
            journal.push(mutation);
        }
    }

    /// Panics once the arena would need a slot index past `u32::MAX`.
    fn alloc(&mut self, data: NodeData) -> NodeId {
        let record = NodeRecord {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("live tree exceeded u32::MAX nodes");
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_ref())
            .ok_or(DomError::StaleNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    // ---- inspection ----

    pub fn contains(&self, id: NodeId) -> bool {
        self.record(id).is_ok()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.record(id).ok().map(|r| &r.data)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.data(id).and_then(NodeData::kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.data(id).and_then(NodeData::as_element)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> &[(Arc<str>, String)] {
        self.element(id).map(ElementData::attributes).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// True when `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Concatenated descendant text, as the DOM's `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.data(id) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.clone(),
            Some(NodeData::Element(_)) | Some(NodeData::Fragment) => {
                let mut out = String::new();
                let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
                while let Some(node) = stack.pop() {
                    match self.data(node) {
                        Some(NodeData::Text(text)) => out.push_str(text),
                        Some(NodeData::Element(_)) => {
                            stack.extend(self.children(node).iter().rev().copied());
                        }
                        _ => {}
                    }
                }
                out
            }
            None => String::new(),
        }
    }

    /// Text content when the node has no children, `None` otherwise.
    pub fn leaf_content(&self, id: NodeId) -> Option<String> {
        if self.children(id).is_empty() {
            Some(self.text_content(id))
        } else {
            None
        }
    }

    pub fn value(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return String::new();
        };
        if let Some(value) = &element.form.value {
            return value.clone();
        }
        if element.name() == "textarea" {
            return self.text_content(id);
        }
        element.attr("value").unwrap_or_default().to_string()
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|e| e.form.checked.unwrap_or_else(|| e.attr("checked").is_some()))
    }

    pub fn selected(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|e| e.form.selected.unwrap_or_else(|| e.attr("selected").is_some()))
    }

    pub fn form_state(&self, id: NodeId) -> Option<&FormState> {
        self.element(id).map(ElementData::form)
    }

    // ---- creation ----
    //
    // Creation never fails on caller input. Every `create_*` and `import` panics
    // only if the tree would grow past `u32::MAX` live slots.

    /// # Panics
    ///
    /// If the tree already holds `u32::MAX` slots and none are free.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let id = self.alloc(NodeData::Element(new_element(name, Vec::new())));
        self.log(Mutation::Create { node: id });
        id
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeData::Text(text.to_string()));
        self.log(Mutation::Create { node: id });
        id
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeData::Comment(text.to_string()));
        self.log(Mutation::Create { node: id });
        id
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    /// Deep-clones a template subtree into a detached live subtree, attributes
    /// verbatim. Recorded as a single `Create`.
    ///
    /// # Panics
    ///
    /// If the subtree does not fit in the remaining `u32` slot space.
    pub fn import(&mut self, node: &Node) -> NodeId {
        let root = self.alloc(data_from_template(node));
        let mut stack: Vec<(&Node, NodeId)> = vec![(node, root)];
        while let Some((template, parent)) = stack.pop() {
            for child in template.children() {
                let id = self.alloc(data_from_template(child));
                self.attach(parent, id, None);
                if !child.children().is_empty() {
                    stack.push((child, id));
                }
            }
        }
        self.log(Mutation::Create { node: root });
        root
    }

    // ---- structure ----

    /// Links a detached, validated child; no journaling.
    fn attach(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) {
        if let Ok(record) = self.record_mut(parent) {
            match at {
                Some(index) => record.children.insert(index, child),
                None => record.children.push(child),
            }
        }
        if let Ok(record) = self.record_mut(child) {
            record.parent = Some(parent);
        }
    }

    /// Unlinks a child from its parent; returns its former position.
    fn detach(&mut self, child: NodeId) -> Option<usize> {
        let parent = self.record_mut(child).ok()?.parent.take()?;
        let siblings = &mut self.record_mut(parent).ok()?.children;
        let position = siblings.iter().position(|&c| c == child)?;
        siblings.remove(position);
        Some(position)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `before` (or at the end).
    ///
    /// An attached child is moved and keeps its identity and state; a fragment
    /// contributes its children as one batch and is left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.record(parent)?.data.allows_children() {
            return Err(DomError::NotAParent(parent));
        }
        let child_record = self.record(child)?;
        let is_fragment = matches!(child_record.data, NodeData::Fragment);
        let is_attached = child_record.parent.is_some();
        if child == self.root {
            return Err(DomError::RootIsFixed(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        if let Some(before) = before {
            if self.record(before)?.parent != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: before,
                });
            }
            if before == child {
                return Ok(());
            }
        }

        if is_fragment {
            let nodes = std::mem::take(&mut self.record_mut(child)?.children);
            if nodes.is_empty() {
                return Ok(());
            }
            let mut at = self.position_of(parent, before);
            for &node in &nodes {
                self.attach(parent, node, Some(at));
                at += 1;
            }
            self.log(Mutation::InsertFragment {
                parent,
                nodes,
                before,
            });
            return Ok(());
        }

        if is_attached {
            if self.is_in_place(parent, child, before) {
                return Ok(());
            }
            self.detach(child);
            let at = self.position_of(parent, before);
            self.attach(parent, child, Some(at));
            self.log(Mutation::Move {
                parent,
                node: child,
                before,
            });
            return Ok(());
        }

        let at = self.position_of(parent, before);
        self.attach(parent, child, Some(at));
        self.log(Mutation::Insert {
            parent,
            node: child,
            before,
        });
        Ok(())
    }

    fn position_of(&self, parent: NodeId, before: Option<NodeId>) -> usize {
        let siblings = self.children(parent);
        before
            .and_then(|b| siblings.iter().position(|&c| c == b))
            .unwrap_or(siblings.len())
    }

    fn is_in_place(&self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> bool {
        let siblings = self.children(parent);
        let Some(position) = siblings.iter().position(|&c| c == child) else {
            return false;
        };
        siblings.get(position + 1).copied() == before
    }

    /// Removes and frees a node with its subtree. Freeing a detached node is
    /// not a tree mutation and is not journaled.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root {
            return Err(DomError::RootIsFixed(id));
        }
        let attached = self.record(id)?.parent.is_some();
        self.detach(id);
        self.free_subtree(id);
        if attached {
            self.log(Mutation::Remove { node: id });
        }
        Ok(())
    }

    /// Removes all children; returns whether anything was removed.
    pub fn clear_children(&mut self, id: NodeId) -> Result<bool, DomError> {
        let children = std::mem::take(&mut self.record_mut(id)?.children);
        if children.is_empty() {
            return Ok(false);
        }
        for child in children {
            self.free_subtree(child);
        }
        self.log(Mutation::ClearChildren { node: id });
        Ok(true)
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(slot) = self.slots.get_mut(node.index as usize) else {
                continue;
            };
            if slot.generation != node.generation {
                continue;
            }
            if let Some(record) = slot.record.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
                stack.extend(record.children);
            }
        }
    }

    // ---- content ----

    /// Sets an attribute; returns whether the tree changed.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<bool, DomError> {
        let element = self.element_mut(id)?;
        let name: Arc<str> = match element.attributes.iter_mut().find(|(k, _)| k.as_ref() == name) {
            Some((_, existing)) if existing == value => return Ok(false),
            Some((k, existing)) => {
                existing.clear();
                existing.push_str(value);
                Arc::clone(k)
            }
            None => {
                let k = Arc::<str>::from(name);
                element.attributes.push((Arc::clone(&k), value.to_string()));
                k
            }
        };
        self.log(Mutation::SetAttribute {
            node: id,
            name,
            value: value.to_string(),
        });
        Ok(true)
    }

    /// Removes an attribute; returns whether it was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let element = self.element_mut(id)?;
        let Some(position) = element.attributes.iter().position(|(k, _)| k.as_ref() == name) else {
            return Ok(false);
        };
        let (name, _) = element.attributes.remove(position);
        self.log(Mutation::RemoveAttribute { node: id, name });
        Ok(true)
    }

    /// Replaces a node's text: character data for text/comment nodes, a single
    /// text child (or none, for `""`) for elements.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<bool, DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Text(existing) | NodeData::Comment(existing) => {
                if existing == text {
                    return Ok(false);
                }
                existing.clear();
                existing.push_str(text);
            }
            NodeData::Element(_) | NodeData::Fragment => {
                let children = self.children(id);
                let unchanged = match children {
                    [] => text.is_empty(),
                    [only] => matches!(self.data(*only), Some(NodeData::Text(t)) if t == text),
                    _ => false,
                };
                if unchanged {
                    return Ok(false);
                }
                let children = std::mem::take(&mut self.record_mut(id)?.children);
                for child in children {
                    self.free_subtree(child);
                }
                if !text.is_empty() {
                    let node = self.alloc(NodeData::Text(text.to_string()));
                    self.attach(id, node, None);
                }
            }
        }
        self.log(Mutation::SetText {
            node: id,
            text: text.to_string(),
        });
        Ok(true)
    }

    /// Writes the live `value` property (marks it dirty).
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<bool, DomError> {
        let current = self.value(id);
        let element = self.element_mut(id)?;
        element.form.value = Some(value.to_string());
        if current == value {
            return Ok(false);
        }
        self.log(Mutation::SetValue {
            node: id,
            value: value.to_string(),
        });
        Ok(true)
    }

    /// Writes the live `checked` property (marks it dirty).
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<bool, DomError> {
        let current = self.checked(id);
        self.element_mut(id)?.form.checked = Some(checked);
        if current == checked {
            return Ok(false);
        }
        self.log(Mutation::SetChecked { node: id, checked });
        Ok(true)
    }

    /// Writes the live `selected` property (marks it dirty).
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<bool, DomError> {
        let current = self.selected(id);
        self.element_mut(id)?.form.selected = Some(selected);
        if current == selected {
            return Ok(false);
        }
        self.log(Mutation::SetSelected { node: id, selected });
        Ok(true)
    }

    // ---- materialization ----

    /// Copies a live subtree into template shape (attributes only; live form
    /// state is not serialized). Fragments materialize as `#document-fragment`.
    pub fn materialize(&self, id: NodeId) -> Result<Node, DomError> {
        let record = self.record(id)?;
        let node = match &record.data {
            NodeData::Element(element) => Node::Element {
                name: Arc::clone(&element.name),
                attributes: element.attributes.clone(),
                children: record
                    .children
                    .iter()
                    .map(|&child| self.materialize(child))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            NodeData::Fragment => Node::Element {
                name: Arc::from("#document-fragment"),
                attributes: Vec::new(),
                children: record
                    .children
                    .iter()
                    .map(|&child| self.materialize(child))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            NodeData::Text(text) => Node::Text { text: text.clone() },
            NodeData::Comment(text) => Node::Comment { text: text.clone() },
        };
        Ok(node)
    }

    pub fn inner_html(&self, id: NodeId) -> Result<String, DomError> {
        Ok(html::inner_html(&self.materialize(id)?))
    }
}

fn new_element(name: &str, attributes: Vec<(Arc<str>, String)>) -> ElementData {
    ElementData {
        name: Arc::from(name.to_ascii_lowercase()),
        attributes,
        form: FormState::default(),
    }
}

fn data_from_template(node: &Node) -> NodeData {
    match node {
        Node::Element {
            name, attributes, ..
        } => NodeData::Element(ElementData {
            name: Arc::clone(name),
            attributes: attributes.clone(),
            form: FormState::default(),
        }),
        Node::Text { text } => NodeData::Text(text.clone()),
        Node::Comment { text } => NodeData::Comment(text.clone()),
    }
}
