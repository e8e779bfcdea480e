//! Positional diff/patch of template children onto live children.
//!
//! Children are walked in lock-step by index. A live child that is not the
//! same node as the template child (see `matcher::is_different`) is first
//! looked for further along its siblings and moved into place; otherwise a
//! sanitized clone is inserted. Aligned nodes get their attributes diffed, text
//! updated and children reconciled recursively, except under opaque
//! (hyphenated) elements. Live children past the template's count are removed.
//!
//! A template containing `<script>` is refused before any write.

use crate::matcher::is_different;
use crate::sanitize::{Delegate, Sanitizer};
use dom::{DomError, LiveDom, NodeData, NodeId};
use html::Node;
use std::fmt;

/// Counts of effective changes made by one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub inserted: usize,
    pub moved: usize,
    pub removed: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub texts_updated: usize,
}

impl PatchStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn absorb(&mut self, other: PatchStats) {
        self.inserted += other.inserted;
        self.moved += other.moved;
        self.removed += other.removed;
        self.attributes_set += other.attributes_set;
        self.attributes_removed += other.attributes_removed;
        self.texts_updated += other.texts_updated;
    }
}

impl fmt::Display for PatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} moved={} removed={} attrs_set={} attrs_removed={} texts={}",
            self.inserted,
            self.moved,
            self.removed,
            self.attributes_set,
            self.attributes_removed,
            self.texts_updated
        )
    }
}

#[derive(Default)]
pub struct PatchOptions<'d> {
    /// Accept inline `on*` attributes as plain attributes.
    pub allow_inline_events: bool,
    pub delegate: Option<&'d mut dyn Delegate>,
}

impl fmt::Debug for PatchOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchOptions")
            .field("allow_inline_events", &self.allow_inline_events)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The template holds script elements; the live tree was not touched.
    ScriptInjection { scripts: usize },
    /// The live root is stale or cannot hold children.
    InvalidRoot(NodeId),
    Dom(DomError),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::ScriptInjection { scripts } => {
                write!(f, "template contains {scripts} script element(s); render refused")
            }
            ReconcileError::InvalidRoot(id) => write!(f, "live root {id} cannot be patched"),
            ReconcileError::Dom(err) => write!(f, "live tree error: {err}"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomError> for ReconcileError {
    fn from(err: DomError) -> Self {
        ReconcileError::Dom(err)
    }
}

/// Reconciles the children of `live_root` against the children of `template`.
/// The live root itself is never replaced.
pub fn patch(
    template: &Node,
    dom: &mut LiveDom,
    live_root: NodeId,
    options: PatchOptions<'_>,
) -> Result<PatchStats, ReconcileError> {
    if !dom.data(live_root).is_some_and(NodeData::allows_children) {
        return Err(ReconcileError::InvalidRoot(live_root));
    }
    let scripts = template.count_elements("script");
    if scripts > 0 {
        log::warn!(target: "reconcile", "refusing render into {live_root}: {scripts} script element(s) in template");
        return Err(ReconcileError::ScriptInjection { scripts });
    }

    let mut reconciler = Reconciler {
        dom,
        sanitizer: Sanitizer::new(options.allow_inline_events, options.delegate),
        stats: PatchStats::default(),
    };
    reconciler.diff_children(template, live_root)?;

    let mut stats = reconciler.stats;
    stats.absorb(reconciler.sanitizer.stats);
    log::debug!(target: "reconcile", "patched {live_root}: {stats}");
    Ok(stats)
}

struct Reconciler<'a, 'd> {
    dom: &'a mut LiveDom,
    sanitizer: Sanitizer<'d>,
    stats: PatchStats,
}

impl Reconciler<'_, '_> {
    fn diff_children(&mut self, template: &Node, parent: NodeId) -> Result<(), ReconcileError> {
        let template_children = template.children();
        for (index, node) in template_children.iter().enumerate() {
            let Some(current) = self.dom.child_at(parent, index) else {
                let clone = self.clone_template(node)?;
                self.dom.append_child(parent, clone)?;
                self.stats.inserted += 1;
                continue;
            };

            let live = if is_different(node, self.dom, current) {
                match self.ahead_in_tree(node, parent, index) {
                    Some(ahead) => {
                        self.dom.insert_before(parent, ahead, Some(current))?;
                        self.stats.moved += 1;
                        ahead
                    }
                    None => {
                        let clone = self.clone_template(node)?;
                        self.dom.insert_before(parent, clone, Some(current))?;
                        self.stats.inserted += 1;
                        continue;
                    }
                }
            } else {
                current
            };

            self.sanitizer.diff_attributes(self.dom, node, live)?;

            match node {
                Node::Element { name, .. } if name.contains('-') => {}
                Node::Text { text } | Node::Comment { text } => {
                    if self.dom.set_text_content(live, text)? {
                        self.stats.texts_updated += 1;
                    }
                }
                Node::Element { children, .. } if children.is_empty() => {
                    let count = self.dom.child_count(live);
                    if self.dom.clear_children(live)? {
                        self.stats.removed += count;
                    }
                }
                Node::Element { .. } if self.dom.child_count(live) == 0 => {
                    let fragment = self.dom.create_fragment();
                    self.diff_children(node, fragment)?;
                    self.dom.append_child(live, fragment)?;
                    self.dom.remove(fragment)?;
                }
                Node::Element { .. } => self.diff_children(node, live)?,
            }
        }
        self.trim(parent, template_children.len())
    }

    /// First later sibling that is the same node as `node`.
    fn ahead_in_tree(&self, node: &Node, parent: NodeId, index: usize) -> Option<NodeId> {
        self.dom
            .children(parent)
            .iter()
            .skip(index + 1)
            .copied()
            .find(|&candidate| !is_different(node, self.dom, candidate))
    }

    fn clone_template(&mut self, node: &Node) -> Result<NodeId, ReconcileError> {
        let clone = self.dom.import(node);
        self.sanitizer.apply_defaults(self.dom, clone)?;
        Ok(clone)
    }

    fn trim(&mut self, parent: NodeId, len: usize) -> Result<(), ReconcileError> {
        while self.dom.child_count(parent) > len {
            if let Some(&last) = self.dom.children(parent).last() {
                self.dom.remove(last)?;
                self.stats.removed += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(dom: &mut LiveDom, markup: &str) -> PatchStats {
        let root = dom.root();
        patch(&html::build(markup), dom, root, PatchOptions::default()).expect("patch succeeds")
    }

    #[test]
    fn empty_live_tree_is_filled() {
        let mut dom = LiveDom::new();
        let stats = render(&mut dom, "<h1>Hi</h1><p>there</p>");
        assert_eq!(stats.inserted, 2);
        assert_eq!(dom.inner_html(dom.root()).unwrap(), "<h1>Hi</h1><p>there</p>");
    }

    #[test]
    fn text_is_updated_in_place() {
        let mut dom = LiveDom::from_markup("<p>old</p>");
        let p = dom.child_at(dom.root(), 0).unwrap();
        let text = dom.child_at(p, 0).unwrap();
        let stats = render(&mut dom, "<p>new</p>");
        assert_eq!(stats.texts_updated, 1);
        assert_eq!(dom.child_at(p, 0), Some(text));
        assert_eq!(dom.text_content(p), "new");
    }

    #[test]
    fn missing_node_is_inserted_before_mismatch() {
        let mut dom = LiveDom::from_markup("<p>b</p>");
        let p = dom.child_at(dom.root(), 0).unwrap();
        let stats = render(&mut dom, "<h2>a</h2><p>b</p>");
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.removed, 0);
        assert_eq!(dom.child_at(dom.root(), 1), Some(p));
    }

    #[test]
    fn emptied_template_clears_live_children() {
        let mut dom = LiveDom::from_markup("<ul><li>a</li><li>b</li></ul>");
        let stats = render(&mut dom, "<ul></ul>");
        assert_eq!(stats.removed, 2);
        assert_eq!(dom.inner_html(dom.root()).unwrap(), "<ul></ul>");
    }

    #[test]
    fn empty_live_element_is_filled_through_one_fragment_insert() {
        let mut dom = LiveDom::from_markup("<ul></ul>");
        dom.enable_journal();
        render(&mut dom, "<ul><li>a</li><li>b</li></ul>");
        let batches = dom
            .mutations()
            .iter()
            .filter(|m| matches!(m, dom::Mutation::InsertFragment { .. }))
            .count();
        assert_eq!(batches, 1);
        assert_eq!(dom.inner_html(dom.root()).unwrap(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn invalid_roots_are_rejected() {
        let mut dom = LiveDom::from_markup("text");
        let text = dom.child_at(dom.root(), 0).unwrap();
        let err = patch(&html::build("<p></p>"), &mut dom, text, PatchOptions::default()).unwrap_err();
        assert_eq!(err, ReconcileError::InvalidRoot(text));
    }

    #[test]
    fn scripts_abort_before_any_write() {
        let mut dom = LiveDom::from_markup("<p>a</p>");
        let before = dom.mutation_count();
        let root = dom.root();
        let err = patch(
            &html::build("<p>b</p><div><script>x()</script></div>"),
            &mut dom,
            root,
            PatchOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ReconcileError::ScriptInjection { scripts: 1 });
        assert_eq!(dom.mutation_count(), before);
        assert_eq!(dom.inner_html(root).unwrap(), "<p>a</p>");
    }
}
