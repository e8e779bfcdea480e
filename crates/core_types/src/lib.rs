use std::fmt;
use std::sync::Arc;

/// Name of a publish/subscribe channel, e.g. `reef:store` or `reef:store-todos`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Arc<str>);

impl ChannelId {
    pub const DEFAULT_STORE: &'static str = "reef:store";

    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Channel used by a store with the given namespace (`""` maps to the default channel).
    pub fn for_store(namespace: &str) -> Self {
        if namespace.is_empty() {
            Self::new(Self::DEFAULT_STORE)
        } else {
            Self::new(format!("{}-{namespace}", Self::DEFAULT_STORE))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Monotonic change counter attached to every published notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(pub u64);

impl Revision {
    pub const INITIAL: Revision = Revision(0);

    pub fn next(self) -> Self {
        Revision(self.0.wrapping_add(1))
    }
}
