//! Reactive layer around the reconciler: stores that publish on change,
//! renders bound to store channels, and debounced components.

mod binding;
mod component;
mod scheduler;
mod store;

pub use binding::{Rendered, StoreBinding, render};
pub use component::{Component, ComponentOptions};
pub use scheduler::{FrameRequest, FrameScheduler};
pub use store::{Store, StoreBuilder, StoreError};
