//! Coarse node identity used to align template and live children.

use crate::sanitize::is_unsafe_uri;
use dom::{LiveDom, NodeId};
use html::Node;

/// Elements whose `src` takes part in identity.
const SOURCE_ELEMENTS: &[&str] = &[
    "audio", "embed", "frame", "iframe", "img", "input", "script", "source", "track", "video",
];

/// True when `live` cannot be patched in place to become `template`.
///
/// Compares kind, then (for elements) tag name, `id`, and for source-bearing
/// elements `src`. Missing `id`/`src` compare as the empty string. Attribute and
/// content differences are not identity differences.
pub fn is_different(template: &Node, dom: &LiveDom, live: NodeId) -> bool {
    let Some(kind) = dom.kind(live) else {
        return true;
    };
    if template.kind() != kind {
        return true;
    }
    let Node::Element { name, .. } = template else {
        return false;
    };
    let Some(tag) = dom.tag(live) else {
        return true;
    };
    if !html::tag_eq(name, tag) {
        return true;
    }
    if template.attr("id").unwrap_or_default() != dom.attr(live, "id").unwrap_or_default() {
        return true;
    }
    if has_source(name) && template_source(template) != dom.attr(live, "src").unwrap_or_default() {
        return true;
    }
    false
}

fn has_source(tag: &str) -> bool {
    SOURCE_ELEMENTS.iter().any(|t| html::tag_eq(t, tag))
}

/// The `src` a clone of `template` would end up with: rejected values never
/// reach the live tree, so they compare as absent.
fn template_source(template: &Node) -> &str {
    match template.attr("src") {
        Some(src) if !is_unsafe_uri(src) => src,
        _ => "",
    }
}
