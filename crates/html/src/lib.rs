//! Markup front end: tokenizer, template tree model and the tree builder that
//! turns a markup string into the `body`-rooted template tree.

pub mod snapshot;
pub mod tree_builder;

mod entities;
mod tokenizer;
mod types;

pub use crate::snapshot::{DomSnapshot, inner_html, to_html};
pub use crate::tokenizer::tokenize;
pub use crate::tree_builder::{TreeBuilder, TreeBuilderStats, build, build_from_tokens};
pub use crate::types::{Node, NodeKind, Token};

/// Lower-cased comparison used for tag names throughout the pipeline.
pub fn tag_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
