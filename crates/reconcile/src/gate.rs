//! Render entry point and lifecycle notifications.

use crate::reconciler::{PatchOptions, PatchStats, ReconcileError, patch};
use crate::sanitize::Delegate;
use core_types::ChannelId;
use dom::{LiveDom, NodeId};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeforeRender,
    Render,
    Start,
    Stop,
}

impl LifecycleEvent {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleEvent::BeforeRender => "reef:before-render",
            LifecycleEvent::Render => "reef:render",
            LifecycleEvent::Start => "reef:start",
            LifecycleEvent::Stop => "reef:stop",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Veto,
}

/// Receives lifecycle notifications for renders into a target.
pub trait Observer {
    /// Asked before a pass; any `Veto` skips it.
    fn before_render(&mut self, _target: NodeId) -> Verdict {
        Verdict::Proceed
    }

    fn rendered(&mut self, _target: NodeId, _stats: &PatchStats) {}

    fn started(&mut self, _target: NodeId) {}

    fn stopped(&mut self, _target: NodeId) {}
}

#[derive(Default)]
pub struct Lifecycle {
    observers: Vec<Box<dyn Observer + Send>>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, observer: impl Observer + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Every observer is asked, even after a veto.
    pub fn before_render(&mut self, target: NodeId) -> Verdict {
        let mut verdict = Verdict::Proceed;
        for observer in &mut self.observers {
            if observer.before_render(target) == Verdict::Veto {
                verdict = Verdict::Veto;
            }
        }
        log::trace!(target: "reconcile", "{} on {target}: {verdict:?}", LifecycleEvent::BeforeRender);
        verdict
    }

    pub fn rendered(&mut self, target: NodeId, stats: &PatchStats) {
        log::trace!(target: "reconcile", "{} on {target}", LifecycleEvent::Render);
        for observer in &mut self.observers {
            observer.rendered(target, stats);
        }
    }

    pub fn started(&mut self, target: NodeId) {
        log::trace!(target: "reconcile", "{} on {target}", LifecycleEvent::Start);
        for observer in &mut self.observers {
            observer.started(target);
        }
    }

    pub fn stopped(&mut self, target: NodeId) {
        log::trace!(target: "reconcile", "{} on {target}", LifecycleEvent::Stop);
        for observer in &mut self.observers {
            observer.stopped(target);
        }
    }
}

#[derive(Default)]
pub struct RenderOptions<'d> {
    pub allow_inline_events: bool,
    pub delegate: Option<&'d mut dyn Delegate>,
    /// Channel whose notifications re-render the same markup. Honoured by
    /// `runtime::render`; a direct `gate::render` is always one-shot.
    pub store_channel: Option<ChannelId>,
}

impl fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("allow_inline_events", &self.allow_inline_events)
            .field("delegate", &self.delegate.is_some())
            .field("store_channel", &self.store_channel)
            .finish()
    }
}

impl<'d> RenderOptions<'d> {
    pub fn patch_options(&mut self) -> PatchOptions<'_> {
        PatchOptions {
            allow_inline_events: self.allow_inline_events,
            delegate: self.delegate.as_deref_mut().map(|d| d as &mut dyn Delegate),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(PatchStats),
    /// An observer vetoed the pass; nothing was written.
    Vetoed,
}

impl RenderOutcome {
    pub fn stats(&self) -> Option<&PatchStats> {
        match self {
            RenderOutcome::Rendered(stats) => Some(stats),
            RenderOutcome::Vetoed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Reconcile(ReconcileError),
}

impl RenderError {
    pub fn is_script_injection(&self) -> bool {
        matches!(self, RenderError::Reconcile(ReconcileError::ScriptInjection { .. }))
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Reconcile(err) => write!(f, "render failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Reconcile(err) => Some(err),
        }
    }
}

impl From<ReconcileError> for RenderError {
    fn from(err: ReconcileError) -> Self {
        RenderError::Reconcile(err)
    }
}

/// Parses `markup`, asks observers, reconciles `target` and notifies them.
pub fn render(
    dom: &mut LiveDom,
    target: NodeId,
    markup: &str,
    options: &mut RenderOptions<'_>,
    lifecycle: &mut Lifecycle,
) -> Result<RenderOutcome, RenderError> {
    let template = html::build(markup);
    if lifecycle.before_render(target) == Verdict::Veto {
        log::debug!(target: "reconcile", "render into {target} vetoed");
        return Ok(RenderOutcome::Vetoed);
    }
    let stats = patch(&template, dom, target, options.patch_options())?;
    lifecycle.rendered(target, &stats);
    Ok(RenderOutcome::Rendered(stats))
}
