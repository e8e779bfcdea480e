//! Template-to-live-tree reconciliation.
//!
//! `gate::render` is the entry point: it builds a template tree from markup,
//! runs lifecycle observers, and calls `reconciler::patch`, which aligns
//! children with `matcher` and routes every attribute write through
//! `sanitize::Sanitizer`.

pub mod gate;
pub mod matcher;
pub mod reconciler;
pub mod sanitize;

pub use gate::{
    Lifecycle, LifecycleEvent, Observer, RenderError, RenderOptions, RenderOutcome, Verdict, render,
};
pub use matcher::is_different;
pub use reconciler::{PatchOptions, PatchStats, ReconcileError, patch};
pub use sanitize::{Delegate, Delegation, EventBinding, EventDelegate, Sanitizer};
