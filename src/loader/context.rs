use std::sync::{Arc, Weak};

use crate::fetch::StreamFetch;
use crate::res::ResourceManager;
use crate::settings::EnvParams;

/// Services injected into loaders.
///
/// The resource manager is held weakly. Once its owner has dropped it, the host is
/// considered to be shutting down, and loaders created from then on abort silently.
#[derive(Clone)]
pub struct LoaderContext {
    resources: Weak<dyn ResourceManager>,
    fetch: Arc<dyn StreamFetch>,
    env: EnvParams,
}

impl LoaderContext {
    pub fn new(
        resources: &Arc<dyn ResourceManager>,
        fetch: Arc<dyn StreamFetch>,
        env: EnvParams,
    ) -> Self {
        LoaderContext {
            resources: Arc::downgrade(resources),
            fetch,
            env,
        }
    }

    /// Returns the resource manager if it is still available.
    #[inline]
    pub fn resources(&self) -> Option<Arc<dyn ResourceManager>> {
        self.resources.upgrade()
    }

    #[inline]
    pub fn fetch(&self) -> &dyn StreamFetch {
        &*self.fetch
    }

    #[inline]
    pub fn env(&self) -> EnvParams {
        self.env
    }
}
