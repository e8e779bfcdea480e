//! Renders that re-run whenever their store channel publishes.

use bus::{Bus, Subscription};
use dom::{LiveDom, NodeId};
use reconcile::{Lifecycle, RenderError, RenderOptions, RenderOutcome};

/// A render subscribed to a store channel. Each pending notification re-renders
/// the same markup into the same target.
#[derive(Debug)]
pub struct StoreBinding<'d> {
    target: NodeId,
    markup: String,
    options: RenderOptions<'d>,
    subscription: Subscription,
}

#[derive(Debug)]
pub struct Rendered<'d> {
    pub outcome: RenderOutcome,
    /// Present when a store channel was requested and the first pass was not
    /// vetoed.
    pub binding: Option<StoreBinding<'d>>,
}

/// Renders `markup` into `target`; with `options.store_channel` set, also
/// subscribes so later store changes re-render.
pub fn render<'d>(
    dom: &mut LiveDom,
    target: NodeId,
    markup: &str,
    mut options: RenderOptions<'d>,
    lifecycle: &mut Lifecycle,
    bus: &Bus,
) -> Result<Rendered<'d>, RenderError> {
    let outcome = reconcile::render(dom, target, markup, &mut options, lifecycle)?;
    if outcome == RenderOutcome::Vetoed {
        return Ok(Rendered {
            outcome,
            binding: None,
        });
    }
    let binding = options.store_channel.clone().map(|channel| {
        log::debug!(target: "runtime", "binding render into {target} to {channel}");
        StoreBinding {
            target,
            markup: markup.to_string(),
            subscription: bus.subscribe(channel),
            options,
        }
    });
    Ok(Rendered { outcome, binding })
}

impl StoreBinding<'_> {
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Re-renders once per queued notification; returns the outcomes.
    pub fn pump(
        &mut self,
        dom: &mut LiveDom,
        lifecycle: &mut Lifecycle,
    ) -> Result<Vec<RenderOutcome>, RenderError> {
        let mut outcomes = Vec::new();
        while let Some(notification) = self.subscription.try_next() {
            log::trace!(target: "runtime", "re-render {} for {:?}", self.target, notification.revision);
            outcomes.push(reconcile::render(
                dom,
                self.target,
                &self.markup,
                &mut self.options,
                lifecycle,
            )?);
        }
        Ok(outcomes)
    }

    pub fn unbind(self, bus: &Bus) {
        bus.unsubscribe(&self.subscription);
    }
}
