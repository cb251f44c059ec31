//! The host side of the frame loop.
//!
//! Loaders never spawn threads. Anything that has to wait, like a stream fetch, is
//! resumed once per tick by a `LifecycleListener` attached to the `LifecycleSystem`
//! owned by the host application.

pub mod lifecycle;

pub mod prelude {
    pub use super::lifecycle::{LifecycleListener, LifecycleListenerHandle, LifecycleSystem};
}
