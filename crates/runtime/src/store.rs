//! Reactive data with an explicit mutator interface.
//!
//! A `Store` never hands out its data: readers get a `snapshot()` copy and
//! writers call one of the named mutators fixed at build time. Each completed
//! mutator call publishes on the store's channel.

use bus::Bus;
use core_types::ChannelId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Mutator<T, A> = Box<dyn Fn(&mut T, A) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownMutator(String),
    DuplicateMutator(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownMutator(name) => write!(f, "store has no mutator named {name:?}"),
            StoreError::DuplicateMutator(name) => write!(f, "mutator {name:?} registered twice"),
        }
    }
}

impl std::error::Error for StoreError {}

pub struct StoreBuilder<T, A = ()> {
    data: T,
    channel: ChannelId,
    mutators: Vec<(String, Mutator<T, A>)>,
}

impl<T, A> StoreBuilder<T, A> {
    /// Publishes on `reef:store-<namespace>` instead of `reef:store`.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.channel = ChannelId::for_store(namespace);
        self
    }

    pub fn mutator(
        mut self,
        name: impl Into<String>,
        mutator: impl Fn(&mut T, A) + Send + Sync + 'static,
    ) -> Self {
        self.mutators.push((name.into(), Box::new(mutator)));
        self
    }

    pub fn build(self, bus: Arc<Bus>) -> Result<Store<T, A>, StoreError> {
        let mut mutators = BTreeMap::new();
        for (name, mutator) in self.mutators {
            if mutators.contains_key(&name) {
                return Err(StoreError::DuplicateMutator(name));
            }
            mutators.insert(name, mutator);
        }
        Ok(Store {
            data: Mutex::new(self.data),
            channel: self.channel,
            mutators,
            bus,
        })
    }
}

pub struct Store<T, A = ()> {
    data: Mutex<T>,
    channel: ChannelId,
    mutators: BTreeMap<String, Mutator<T, A>>,
    bus: Arc<Bus>,
}

impl<T, A> fmt::Debug for Store<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("channel", &self.channel)
            .field("mutators", &self.mutators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T, A> Store<T, A> {
    pub fn builder(data: T) -> StoreBuilder<T, A> {
        StoreBuilder {
            data,
            channel: ChannelId::for_store(""),
            mutators: Vec::new(),
        }
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn mutator_names(&self) -> impl Iterator<Item = &str> {
        self.mutators.keys().map(String::as_str)
    }

    /// Runs the named mutator, then publishes. Returns how many subscribers
    /// were notified.
    pub fn call(&self, name: &str, arg: A) -> Result<usize, StoreError> {
        let mutator = self
            .mutators
            .get(name)
            .ok_or_else(|| StoreError::UnknownMutator(name.to_string()))?;
        {
            let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
            mutator(&mut *data, arg);
        }
        log::debug!(target: "runtime", "store {} ran {name}", self.channel);
        Ok(self.bus.publish(&self.channel))
    }
}

impl<T: Clone, A> Store<T, A> {
    /// Deep copy of the current data.
    pub fn snapshot(&self) -> T {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
