//! Debounced, store-driven rendering of a template function into a target.

use crate::scheduler::FrameScheduler;
use bus::{Bus, Subscription};
use core_types::ChannelId;
use dom::{LiveDom, NodeId};
use reconcile::{Delegate, EventDelegate, Lifecycle, RenderError, RenderOptions, RenderOutcome};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ComponentOptions {
    /// Store namespaces to follow; empty follows the default `reef:store`.
    pub stores: Vec<String>,
    pub allow_inline_events: bool,
    /// Route `on*` attributes to an owned `EventDelegate`.
    pub delegate_events: bool,
}

pub struct Component<F> {
    target: NodeId,
    template: F,
    channels: Vec<ChannelId>,
    subscriptions: Vec<Subscription>,
    allow_inline_events: bool,
    delegate: Option<EventDelegate>,
    frames: FrameScheduler,
    lifecycle: Lifecycle,
    bus: Arc<Bus>,
}

impl<F: FnMut() -> String> fmt::Debug for Component<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("target", &self.target)
            .field("channels", &self.channels)
            .field("running", &self.is_running())
            .field("frames", &self.frames)
            .finish()
    }
}

impl<F: FnMut() -> String> Component<F> {
    /// Creates a stopped component.
    pub fn new(bus: Arc<Bus>, target: NodeId, template: F, options: ComponentOptions) -> Self {
        let channels = if options.stores.is_empty() {
            vec![ChannelId::for_store("")]
        } else {
            options
                .stores
                .iter()
                .map(|store| ChannelId::for_store(store))
                .collect()
        };
        Self {
            target,
            template,
            channels,
            subscriptions: Vec::new(),
            allow_inline_events: options.allow_inline_events,
            delegate: options.delegate_events.then(EventDelegate::new),
            frames: FrameScheduler::new(),
            lifecycle: Lifecycle::new(),
            bus,
        }
    }

    /// Creates and starts a component.
    pub fn mount(bus: Arc<Bus>, target: NodeId, template: F, options: ComponentOptions) -> Self {
        let mut component = Self::new(bus, target, template, options);
        component.start();
        component
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    pub fn is_running(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn has_pending_render(&self) -> bool {
        self.frames.is_pending()
    }

    pub fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    pub fn event_delegate(&self) -> Option<&EventDelegate> {
        self.delegate.as_ref()
    }

    /// Subscribes to the store channels and schedules a render.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.subscriptions = self
            .channels
            .iter()
            .map(|channel| self.bus.subscribe(channel.clone()))
            .collect();
        self.request_render();
        self.lifecycle.started(self.target);
    }

    /// Unsubscribes and drops any pending render.
    pub fn stop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(&subscription);
        }
        self.frames.cancel();
        self.lifecycle.stopped(self.target);
    }

    /// Schedules a render for the next frame, replacing an unfired one.
    pub fn request_render(&mut self) {
        self.frames.request();
    }

    /// Turns queued store notifications into (at most one) render request.
    pub fn pump(&mut self) -> usize {
        let received: usize = self.subscriptions.iter().map(|s| s.drain().len()).sum();
        if received > 0 {
            log::trace!(target: "runtime", "component {} got {received} notification(s)", self.target);
            self.request_render();
        }
        received
    }

    /// Frame boundary: runs the pending render, if any.
    pub fn tick(&mut self, dom: &mut LiveDom) -> Result<Option<RenderOutcome>, RenderError> {
        if self.frames.take_due().is_none() {
            return Ok(None);
        }
        let markup = (self.template)();
        let outcome = {
            let mut options = RenderOptions {
                allow_inline_events: self.allow_inline_events,
                delegate: self.delegate.as_mut().map(|d| d as &mut dyn Delegate),
                store_channel: None,
            };
            reconcile::render(dom, self.target, &markup, &mut options, &mut self.lifecycle)?
        };
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.retain_live(dom);
        }
        Ok(Some(outcome))
    }

    /// `pump` then `tick`.
    pub fn update(&mut self, dom: &mut LiveDom) -> Result<Option<RenderOutcome>, RenderError> {
        self.pump();
        self.tick(dom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_channel_and_namespaced_channels() {
        let bus = Arc::new(Bus::new());
        let dom = LiveDom::new();
        let plain = Component::new(Arc::clone(&bus), dom.root(), String::new, ComponentOptions::default());
        assert_eq!(plain.channels(), &[ChannelId::from("reef:store")]);

        let options = ComponentOptions {
            stores: vec!["todos".into(), "user".into()],
            ..ComponentOptions::default()
        };
        let named = Component::new(bus, dom.root(), String::new, options);
        assert_eq!(
            named.channels(),
            &[ChannelId::from("reef:store-todos"), ChannelId::from("reef:store-user")]
        );
    }

    #[test]
    fn start_schedules_and_tick_renders_once() {
        let bus = Arc::new(Bus::new());
        let mut dom = LiveDom::new();
        let mut component = Component::mount(
            Arc::clone(&bus),
            dom.root(),
            || "<p>hi</p>".to_string(),
            ComponentOptions::default(),
        );
        assert!(component.is_running());
        assert!(component.has_pending_render());
        assert!(matches!(component.tick(&mut dom), Ok(Some(RenderOutcome::Rendered(_)))));
        assert!(matches!(component.tick(&mut dom), Ok(None)));
        assert_eq!(dom.inner_html(dom.root()).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn stop_unsubscribes_and_cancels() {
        let bus = Arc::new(Bus::new());
        let mut dom = LiveDom::new();
        let mut component =
            Component::mount(Arc::clone(&bus), dom.root(), String::new, ComponentOptions::default());
        component.stop();
        assert!(!component.is_running());
        assert_eq!(bus.subscriber_count(&ChannelId::from("reef:store")), 0);
        assert!(matches!(component.tick(&mut dom), Ok(None)));
    }
}
