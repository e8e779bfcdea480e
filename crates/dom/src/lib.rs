//! Persistent live tree targeted by the reconciler.
//!
//! `LiveDom` owns every node in a generational arena. Elements carry their
//! attributes plus live form state; all structural and content writes go
//! through `LiveDom` methods so they can be counted and journaled.

mod mutation;
mod node;
mod store;

pub use mutation::{FormProperty, Mutation};
pub use node::{ElementData, FormState, NodeData, NodeId};
pub use store::{DomError, LiveDom};

/// Builds a live tree from `markup` and returns it with its root id.
pub fn parse_into(markup: &str) -> (LiveDom, NodeId) {
    let dom = LiveDom::from_markup(markup);
    let root = dom.root();
    (dom, root)
}
