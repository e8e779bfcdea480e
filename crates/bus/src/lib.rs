//! Channel-keyed publish/subscribe registry.
//!
//! Subscribers receive `Notification`s over std mpsc channels, so a
//! subscription can be drained on whatever thread owns it. Publishing never
//! blocks on subscribers; dropped subscriptions are pruned on the next publish.

use core_types::{ChannelId, Revision};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub channel: ChannelId,
    /// Per-channel publish counter, starting at 1.
    pub revision: Revision,
}

#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    channel: ChannelId,
    rx: Receiver<Notification>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn try_next(&self) -> Option<Notification> {
        match self.rx.try_recv() {
            Ok(notification) => Some(notification),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Takes every notification queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.rx.try_iter().collect()
    }

    pub fn receiver(&self) -> &Receiver<Notification> {
        &self.rx
    }
}

#[derive(Debug, Default)]
struct Channel {
    revision: Revision,
    subscribers: Vec<(SubscriptionId, Sender<Notification>)>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<ChannelId, Channel>,
}

#[derive(Debug, Default)]
pub struct Bus {
    registry: Mutex<Registry>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, channel: impl Into<ChannelId>) -> Subscription {
        let channel = channel.into();
        let (tx, rx) = mpsc::channel();
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .channels
            .entry(channel.clone())
            .or_default()
            .subscribers
            .push((id, tx));
        log::debug!(target: "bus", "subscribed {id:?} to {channel}");
        Subscription { id, channel, rx }
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut registry = self.registry();
        let Some(channel) = registry.channels.get_mut(&subscription.channel) else {
            return false;
        };
        let before = channel.subscribers.len();
        channel.subscribers.retain(|(id, _)| *id != subscription.id);
        let removed = channel.subscribers.len() != before;
        if removed {
            log::debug!(target: "bus", "unsubscribed {:?} from {}", subscription.id, subscription.channel);
        }
        removed
    }

    /// Notifies every live subscriber of `channel`; returns how many received it.
    pub fn publish(&self, channel: &ChannelId) -> usize {
        let mut registry = self.registry();
        let entry = registry.channels.entry(channel.clone()).or_default();
        entry.revision = entry.revision.next();
        let notification = Notification {
            channel: channel.clone(),
            revision: entry.revision,
        };
        entry
            .subscribers
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
        let delivered = entry.subscribers.len();
        log::trace!(target: "bus", "published {channel} {:?} to {delivered} subscriber(s)", notification.revision);
        delivered
    }

    pub fn subscriber_count(&self, channel: &ChannelId) -> usize {
        self.registry()
            .channels
            .get(channel)
            .map_or(0, |c| c.subscribers.len())
    }

    /// Last published revision of `channel`.
    pub fn revision(&self, channel: &ChannelId) -> Revision {
        self.registry()
            .channels
            .get(channel)
            .map_or(Revision::INITIAL, |c| c.revision)
    }
}
