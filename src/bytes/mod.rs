//! Raw bytes loading.
//!
//! The `BytesSystem` hands out one `BytesHandle` per distinct `(path, mode)` pair. Sync
//! loads are finished by the time `load` returns; async loads are advanced once per tick
//! by the `LifecycleSystem` the bytes system is attached to. Completion callbacks are
//! always invoked outside of any internal lock, so it is fine to release a handle, or to
//! load another path, from inside of them.

pub mod loader;

pub use self::loader::BytesLoader;

use std::sync::{Arc, Mutex};

use crate::application::prelude::{LifecycleListener, LifecycleListenerHandle, LifecycleSystem};
use crate::errors::*;
use crate::loader::prelude::{LoadFailure, LoadRequest, LoaderContext, LoaderMode, LoaderPool};
use crate::settings::LoaderParams;

impl_handle!(BytesHandle);

/// Immutable, shareable byte buffer.
pub type Bytes = Arc<[u8]>;

type Pool = LoaderPool<BytesHandle, BytesLoader>;

pub struct BytesSystem {
    lifecycle: Arc<LifecycleSystem>,
    lis: LifecycleListenerHandle,
    ctx: LoaderContext,
    pool: Arc<Mutex<Pool>>,
}

struct Lifecycle {
    pool: Arc<Mutex<Pool>>,
}

impl LifecycleListener for Lifecycle {
    fn on_post_update(&mut self) -> Result<(), failure::Error> {
        let completions = self.pool.lock().unwrap().advance()?;
        for v in completions {
            v.fire();
        }

        Ok(())
    }

    fn on_exit(&mut self) -> Result<(), failure::Error> {
        self.pool.lock().unwrap().teardown();
        Ok(())
    }
}

impl Drop for BytesSystem {
    fn drop(&mut self) {
        self.pool.lock().unwrap().teardown();
        self.lifecycle.detach(self.lis);
    }
}

impl BytesSystem {
    pub fn new(lifecycle: Arc<LifecycleSystem>, ctx: LoaderContext, params: &LoaderParams) -> Self {
        let pool = Arc::new(Mutex::new(LoaderPool::new(params.gc_interval())));
        let lis = lifecycle.attach(Lifecycle { pool: pool.clone() });

        BytesSystem {
            lifecycle,
            lis,
            ctx,
            pool,
        }
    }

    /// Loads the bytes behind `path`.
    ///
    /// A live loader of the same path and mode is shared, and has to be released once
    /// more. Errors are only returned if a sync read failed.
    pub fn load<T: AsRef<str>>(&self, path: T, mode: LoaderMode) -> Result<BytesHandle> {
        let request = LoadRequest::new(path.as_ref(), mode);
        let ctx = &self.ctx;

        self.pool
            .lock()
            .unwrap()
            .create(request, |req| BytesLoader::new(req.path(), req.mode(), ctx.clone()))
    }

    /// Registers a callback invoked with the result once `handle` finishes. If it has
    /// finished already, `func` is invoked right away.
    ///
    /// Nothing is invoked if `handle` is released before finishing.
    pub fn on_finish<T>(&self, handle: BytesHandle, func: T)
    where
        T: FnOnce(Option<Bytes>) + Send + 'static,
    {
        let completion = self.pool.lock().unwrap().on_finish(handle, Box::new(func));
        if let Some(completion) = completion {
            completion.fire();
        }
    }

    #[inline]
    pub fn progress(&self, handle: BytesHandle) -> f32 {
        self.pool.lock().unwrap().progress(handle)
    }

    #[inline]
    pub fn is_finished(&self, handle: BytesHandle) -> bool {
        self.pool.lock().unwrap().is_finished(handle)
    }

    #[inline]
    pub fn result(&self, handle: BytesHandle) -> Option<Bytes> {
        self.pool.lock().unwrap().result(handle)
    }

    #[inline]
    pub fn failure(&self, handle: BytesHandle) -> Option<LoadFailure> {
        self.pool.lock().unwrap().failure(handle)
    }

    #[inline]
    pub fn contains(&self, handle: BytesHandle) -> bool {
        self.pool.lock().unwrap().contains(handle)
    }

    /// Returns true if `handle` still holds an unreleased stream fetch.
    #[inline]
    pub fn is_fetching(&self, handle: BytesHandle) -> bool {
        self.pool
            .lock()
            .unwrap()
            .get(handle)
            .map(|v| v.is_fetching())
            .unwrap_or(false)
    }

    /// Releases `handle`. The loader is disposed after the configured grace period once
    /// its last reference is gone.
    #[inline]
    pub fn release(&self, handle: BytesHandle) {
        self.pool.lock().unwrap().release(handle);
    }

    /// Releases `handle`, disposing the loader at once if it was the last reference.
    #[inline]
    pub fn release_now(&self, handle: BytesHandle) {
        self.pool.lock().unwrap().release_now(handle);
    }

    /// Disposes every live loader as part of host shutdown.
    #[inline]
    pub fn teardown(&self) {
        self.pool.lock().unwrap().teardown();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pool.lock().unwrap().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pool.lock().unwrap().is_empty()
    }
}
