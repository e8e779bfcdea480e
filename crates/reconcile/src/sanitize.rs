//! Attribute classification and single-attribute writes on live nodes.
//!
//! Template attribute names carry a few prefixes:
//! - `@name` (alias): apply as `name` even where `name` is user-owned form state.
//! - `#name` (marker): initial value only. Applied as `name` when a node is
//!   cloned into the live tree, skipped when diffing an existing node.
//! - `reef-on*`: written by `EventDelegate` to mark a delegated binding.
//!
//! Every attribute write in a reconciliation pass goes through `Sanitizer`, so
//! unsafe attributes never reach the live tree.

use crate::reconciler::PatchStats;
use dom::{DomError, FormProperty, LiveDom, NodeId};
use html::Node;
use std::fmt;

pub const ALIAS_PREFIX: char = '@';
pub const MARKER_PREFIX: char = '#';
pub const DELEGATE_MARKER_PREFIX: &str = "reef-";

/// Elements whose form state belongs to the user once rendered.
pub const FORM_FIELDS: &[&str] = &["input", "option", "textarea"];
pub const FORM_ATTRIBUTES: &[&str] = &["value", "checked", "selected"];
pub const BOOLEAN_FORM_ATTRIBUTES: &[&str] = &["checked", "selected"];

/// Strings that switch a boolean form attribute off.
pub const FALSY_SENTINELS: &[&str] = &["false", "null", "undefined", "0", "-0", "NaN", "0n", "-0n"];

const URI_ATTRIBUTES: &[&str] = &["src", "href", "xlink:href"];
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "data:text/html"];

pub fn is_falsy(value: &str) -> bool {
    FALSY_SENTINELS.contains(&value)
}

pub fn is_form_field(tag: &str) -> bool {
    FORM_FIELDS.iter().any(|f| html::tag_eq(f, tag))
}

pub fn is_form_attribute(name: &str) -> bool {
    FORM_ATTRIBUTES.contains(&name)
}

/// True when a URI value would execute script once whitespace is removed and
/// case is folded.
pub fn is_unsafe_uri(value: &str) -> bool {
    let folded: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    UNSAFE_SCHEMES.iter().any(|scheme| folded.contains(scheme))
}

/// True when the attribute must never be written as a plain attribute.
pub fn is_unsafe(name: &str, value: &str, events_allowed: bool) -> bool {
    if URI_ATTRIBUTES.contains(&name) && is_unsafe_uri(value) {
        return true;
    }
    if name.starts_with("@on") || name.starts_with("#on") {
        return true;
    }
    !events_allowed && name.starts_with("on")
}

/// Result of handing an attribute to a `Delegate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delegation {
    /// The delegate handled it; nothing else happens for this attribute.
    Consumed,
    /// Continue with the default attribute write.
    Default,
}

/// Caller-supplied hook consulted before every attribute write.
pub trait Delegate {
    fn delegate(
        &mut self,
        dom: &mut LiveDom,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Delegation, DomError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventBinding {
    pub node: NodeId,
    pub event: String,
    pub handler: String,
}

/// Stock delegate: records `on*` attributes as event bindings instead of
/// inline handlers and marks the element with `reef-on*`. Other attributes
/// take the default path.
#[derive(Debug, Default)]
pub struct EventDelegate {
    bindings: Vec<EventBinding>,
}

impl EventDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[EventBinding] {
        &self.bindings
    }

    pub fn handler(&self, node: NodeId, event: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.node == node && b.event == event)
            .map(|b| b.handler.as_str())
    }

    /// Drops bindings whose node was removed or whose marker is gone.
    pub fn retain_live(&mut self, dom: &LiveDom) {
        self.bindings.retain(|b| {
            dom.contains(b.node) && dom.has_attr(b.node, &format!("{DELEGATE_MARKER_PREFIX}on{}", b.event))
        });
    }
}

impl Delegate for EventDelegate {
    fn delegate(
        &mut self,
        dom: &mut LiveDom,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Delegation, DomError> {
        let Some(event) = name.strip_prefix("on") else {
            return Ok(Delegation::Default);
        };
        match self.bindings.iter_mut().find(|b| b.node == node && b.event == event) {
            Some(binding) => {
                if binding.handler != value {
                    binding.handler = value.to_string();
                }
            }
            None => self.bindings.push(EventBinding {
                node,
                event: event.to_string(),
                handler: value.to_string(),
            }),
        }
        dom.set_attribute(node, &format!("{DELEGATE_MARKER_PREFIX}{name}"), "")?;
        log::trace!(target: "reconcile", "delegated {name} on {node}");
        Ok(Delegation::Consumed)
    }
}

/// Applies attribute policy for one reconciliation pass.
pub struct Sanitizer<'d> {
    allow_inline_events: bool,
    delegate: Option<&'d mut dyn Delegate>,
    pub(crate) stats: PatchStats,
}

impl fmt::Debug for Sanitizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("allow_inline_events", &self.allow_inline_events)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

impl<'d> Sanitizer<'d> {
    pub fn new(allow_inline_events: bool, delegate: Option<&'d mut dyn Delegate>) -> Self {
        Self {
            allow_inline_events,
            delegate,
            stats: PatchStats::default(),
        }
    }

    /// Inline handlers pass the sanitizer when allowed or when a delegate will
    /// receive them.
    fn events_allowed(&self) -> bool {
        self.allow_inline_events || self.delegate.is_some()
    }

    /// Writes one attribute: rejected, delegated, form property plus
    /// attribute, or plain attribute.
    pub fn add_attribute(
        &mut self,
        dom: &mut LiveDom,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        if is_unsafe(name, value, self.events_allowed()) {
            log::trace!(target: "reconcile", "rejected attribute {name} on {node}");
            if dom.remove_attribute(node, name)? {
                self.stats.attributes_removed += 1;
            }
            return Ok(());
        }
        if let Some(delegate) = self.delegate.as_deref_mut() {
            if delegate.delegate(dom, node, name, value)? == Delegation::Consumed {
                return Ok(());
            }
        }
        let property_changed = match FormProperty::from_attribute(name) {
            Some(FormProperty::Value) => dom.set_value(node, value)?,
            Some(FormProperty::Checked) => dom.set_checked(node, true)?,
            Some(FormProperty::Selected) => dom.set_selected(node, true)?,
            None => false,
        };
        if dom.set_attribute(node, name, value)? | property_changed {
            self.stats.attributes_set += 1;
        }
        Ok(())
    }

    /// Removes one attribute, clearing the matching form property first.
    pub fn remove_attribute(
        &mut self,
        dom: &mut LiveDom,
        node: NodeId,
        name: &str,
    ) -> Result<(), DomError> {
        let property_changed = match FormProperty::from_attribute(name) {
            Some(FormProperty::Value) => dom.set_value(node, "")?,
            Some(FormProperty::Checked) => dom.set_checked(node, false)?,
            Some(FormProperty::Selected) => dom.set_selected(node, false)?,
            None => false,
        };
        if dom.remove_attribute(node, name)? | property_changed {
            self.stats.attributes_removed += 1;
        }
        Ok(())
    }

    /// Prepares a freshly cloned subtree: strips rejected attributes, hands
    /// attributes to the delegate, and turns `@`/`#` names into real ones.
    pub fn apply_defaults(&mut self, dom: &mut LiveDom, root: NodeId) -> Result<(), DomError> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            stack.extend(dom.children(node).iter().rev().copied());
            let attributes = dom.attributes(node).to_vec();
            for (name, value) in attributes {
                if is_unsafe(&name, &value, self.events_allowed()) {
                    log::trace!(target: "reconcile", "stripped attribute {name} from clone {node}");
                    dom.remove_attribute(node, &name)?;
                    continue;
                }
                if let Some(delegate) = self.delegate.as_deref_mut() {
                    if delegate.delegate(dom, node, &name, &value)? == Delegation::Consumed {
                        dom.remove_attribute(node, &name)?;
                        continue;
                    }
                }
                let Some(real) = name
                    .strip_prefix(ALIAS_PREFIX)
                    .or_else(|| name.strip_prefix(MARKER_PREFIX))
                else {
                    if BOOLEAN_FORM_ATTRIBUTES.contains(&name.as_ref()) && is_falsy(&value) {
                        dom.remove_attribute(node, &name)?;
                    }
                    continue;
                };
                dom.remove_attribute(node, &name)?;
                if BOOLEAN_FORM_ATTRIBUTES.contains(&real) && is_falsy(&value) {
                    continue;
                }
                self.add_attribute(dom, node, real, &value)?;
            }
        }
        Ok(())
    }

    /// Brings the attributes of an aligned live element in line with its
    /// template element.
    pub fn diff_attributes(
        &mut self,
        dom: &mut LiveDom,
        template: &Node,
        live: NodeId,
    ) -> Result<(), DomError> {
        let Node::Element { attributes, .. } = template else {
            return Ok(());
        };
        let form_field = dom.tag(live).is_some_and(is_form_field);

        for (name, value) in attributes {
            if name.starts_with(MARKER_PREFIX) {
                continue;
            }
            if form_field && is_form_attribute(name) {
                continue;
            }
            let real = match name.strip_prefix(ALIAS_PREFIX) {
                Some(real) => real,
                // alias wins over the plain attribute
                None if template.has_attr(&format!("{ALIAS_PREFIX}{name}")) => continue,
                None => name,
            };
            if is_unsafe(name, value, self.events_allowed()) {
                log::trace!(target: "reconcile", "rejected attribute {name} on {live}");
                if dom.remove_attribute(live, real)? {
                    self.stats.attributes_removed += 1;
                }
                continue;
            }
            if BOOLEAN_FORM_ATTRIBUTES.contains(&real) && is_falsy(value) {
                self.remove_attribute(dom, live, real)?;
                continue;
            }
            self.add_attribute(dom, live, real, value)?;
        }

        // A declared name still goes if its live value is unsafe; `#name`
        // declarations never overwrite it above.
        let events_allowed = self.events_allowed();
        let stale: Vec<String> = dom
            .attributes(live)
            .iter()
            .filter(|(name, value)| {
                !declares(template, name) || is_unsafe(name, value, events_allowed)
            })
            .map(|(name, _)| name.to_string())
            .filter(|name| {
                !name
                    .strip_prefix(DELEGATE_MARKER_PREFIX)
                    .is_some_and(|plain| plain.starts_with("on") && template.has_attr(plain))
            })
            .filter(|name| !(form_field && is_form_attribute(name)))
            .collect();
        for name in stale {
            self.remove_attribute(dom, live, &name)?;
        }
        Ok(())
    }
}

/// True when the template carries `name` in plain, alias or marker form.
fn declares(template: &Node, name: &str) -> bool {
    template.attributes().iter().any(|(k, _)| {
        k.as_ref() == name
            || k.strip_prefix(ALIAS_PREFIX) == Some(name)
            || k.strip_prefix(MARKER_PREFIX) == Some(name)
    })
}
